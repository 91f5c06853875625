use chrono::{Datelike, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use kittygram::entity::{achievement, achievement_cat};

use crate::common::{PIXEL_PNG, TEST_PAGE_SIZE, TestApp, png_data_uri, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn authenticated_user_can_list_cats() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.get_with_token(routes::CATS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 0);
        assert!(res.body["next"].is_null());
        assert!(res.body["previous"].is_null());
        assert_eq!(res.body["results"], json!([]));
    }

    #[tokio::test]
    async fn anonymous_user_cannot_list_cats() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::CATS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn cats_are_paginated_in_id_order() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        for i in 0..(TEST_PAGE_SIZE + 2) {
            app.create_cat(&token, &format!("Cat{i}"), &[]).await;
        }

        let first = app.get_with_token(routes::CATS, &token).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["count"], TEST_PAGE_SIZE + 2);
        assert_eq!(
            first.body["results"].as_array().unwrap().len() as u64,
            TEST_PAGE_SIZE
        );
        assert_eq!(first.body["results"][0]["name"], "Cat0");
        assert_eq!(first.body["next"], "/api/cats/?page=2");
        assert!(first.body["previous"].is_null());

        let second = app.get_with_token(&routes::cats_page("2"), &token).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["results"].as_array().unwrap().len(), 2);
        assert!(second.body["next"].is_null());
        assert_eq!(second.body["previous"], "/api/cats/");
    }

    #[tokio::test]
    async fn page_past_the_end_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        app.create_cat(&token, "Barsik", &[]).await;

        for page in ["2", "0", "abc"] {
            let res = app.get_with_token(&routes::cats_page(page), &token).await;
            assert_eq!(res.status, 404, "page={page}: {}", res.text);
            assert_eq!(res.body["message"], "Invalid page.");
        }
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn cat_without_achievements_key_has_none() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Barsik", "color": "#FFFFFF", "birth_year": 2020}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["achievements"], json!([]));
        assert!(res.body["image_url"].is_null());
    }

    #[tokio::test]
    async fn duplicate_achievement_names_share_a_row_but_not_a_link() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.create_cat(&token, "Barsik", &["Brave", "Brave"]).await;
        let cat_id = res.id();

        let rows = achievement::Entity::find()
            .filter(achievement::Column::Name.eq("Brave"))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let links = achievement_cat::Entity::find()
            .filter(achievement_cat::Column::CatId.eq(cat_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 2);
        assert_eq!(res.achievement_names(), vec!["Brave", "Brave"]);
    }

    #[tokio::test]
    async fn existing_achievements_are_reused() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let brave_id = app.create_achievement(&token, "Brave").await;

        let res = app.create_cat(&token, "Barsik", &["Brave"]).await;

        assert_eq!(res.body["achievements"][0]["id"], brave_id);
        let total = achievement::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn hex_color_is_stored_as_its_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.create_cat(&token, "Barsik", &[]).await;

        assert_eq!(res.body["color"], "white");
    }

    #[tokio::test]
    async fn unknown_hex_color_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Barsik", "color": "#123456", "birth_year": 2020}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "color");
        assert_eq!(res.body["message"], "no name exists for this color");
    }

    #[tokio::test]
    async fn color_name_longer_than_the_column_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Barsik", "color": "#FAFAD2", "birth_year": 2020}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "color");
        let cats = app.get_with_token(routes::CATS, &token).await;
        assert_eq!(cats.body["count"], 0);
    }

    #[tokio::test]
    async fn birth_year_may_be_a_numeric_string() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Barsik", "color": "#FFFFFF", "birth_year": "2020"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["birth_year"], 2020);
    }

    #[tokio::test]
    async fn null_achievements_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "achievements": null,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "achievements");
        assert_eq!(res.body["message"], "This field may not be null.");
    }

    #[tokio::test]
    async fn age_is_counted_from_the_current_year() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let year = Utc::now().year();

        let res = app.create_cat(&token, "Barsik", &[]).await;
        assert_eq!(res.body["age"], year - 2020);

        let future = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Kitten", "color": "#000000", "birth_year": year + 3}),
                &token,
            )
            .await;
        assert_eq!(future.status, 201, "{}", future.text);
        assert_eq!(future.body["age"], -3);
    }

    #[tokio::test]
    async fn owner_is_always_the_requester() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let me = app.get_with_token(routes::ME, &token).await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "owner": 9999,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["owner"], me.body["id"]);
    }

    #[tokio::test]
    async fn missing_required_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "Barsik", "color": "#FFFFFF"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "birth_year");
        assert_eq!(res.body["message"], "This field is required.");
    }

    #[tokio::test]
    async fn name_longer_than_sixteen_chars_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({"name": "x".repeat(17), "color": "#FFFFFF", "birth_year": 2020}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "name");
    }

    #[tokio::test]
    async fn data_uri_image_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "image": png_data_uri(PIXEL_PNG),
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let url = res.body["image_url"].as_str().unwrap();
        assert!(url.starts_with("/media/cats/images/"), "{url}");
        assert!(url.ends_with(".png"), "{url}");
        assert!(res.body.get("image").is_none());
    }

    #[tokio::test]
    async fn malformed_base64_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "image": "data:image/png;base64,@@@",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn plain_string_image_is_not_a_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "image": "cat.png",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "image");
    }

    #[tokio::test]
    async fn multipart_form_is_accepted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_cat_form(
                &[
                    ("name", "Barsik"),
                    ("color", "#000000"),
                    ("birth_year", "2019"),
                    ("achievements", r#"[{"achievement_name": "Fluffy"}]"#),
                ],
                Some(("barsik.png", PIXEL_PNG.to_vec())),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["color"], "black");
        assert_eq!(res.body["birth_year"], 2019);
        assert_eq!(res.achievement_names(), vec!["Fluffy"]);
        assert!(res.body["image_url"].as_str().unwrap().ends_with(".png"));
    }
}

mod updating {
    use super::*;

    #[tokio::test]
    async fn new_achievement_set_replaces_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["A", "B"]).await.id();

        let res = app
            .patch_with_token(
                &routes::cat(cat_id),
                &json!({"achievements": [{"achievement_name": "C"}]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.achievement_names(), vec!["C"]);

        let links = achievement_cat::Entity::find()
            .filter(achievement_cat::Column::CatId.eq(cat_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 1);
        // A and B survive as achievements.
        assert_eq!(achievement::Entity::find().count(&app.db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn kept_achievements_are_not_relinked() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["A", "B"]).await.id();

        let res = app
            .patch_with_token(
                &routes::cat(cat_id),
                &json!({"achievements": [
                    {"achievement_name": "B"},
                    {"achievement_name": "C"},
                    {"achievement_name": "C"}
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.achievement_names(), vec!["B", "C"]);
    }

    #[tokio::test]
    async fn empty_list_clears_achievements() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["A"]).await.id();

        let res = app
            .patch_with_token(&routes::cat(cat_id), &json!({"achievements": []}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["achievements"], json!([]));
    }

    #[tokio::test]
    async fn omitted_achievements_are_left_alone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["A"]).await.id();

        let res = app
            .put_with_token(
                &routes::cat(cat_id),
                &json!({"name": "Murzik", "color": "#000000", "birth_year": 2018}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Murzik");
        assert_eq!(res.body["color"], "black");
        assert_eq!(res.achievement_names(), vec!["A"]);
    }

    #[tokio::test]
    async fn full_update_requires_every_field() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &[]).await.id();

        let res = app
            .put_with_token(&routes::cat(cat_id), &json!({"name": "Murzik"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "color");
    }

    #[tokio::test]
    async fn null_image_removes_it() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let created = app
            .post_with_token(
                routes::CATS,
                &json!({
                    "name": "Barsik",
                    "color": "#FFFFFF",
                    "birth_year": 2020,
                    "image": png_data_uri(PIXEL_PNG),
                }),
                &token,
            )
            .await;
        assert!(created.body["image_url"].is_string());

        let res = app
            .patch_with_token(&routes::cat(created.id()), &json!({"image": null}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["image_url"].is_null());
    }

    #[tokio::test]
    async fn invalid_update_changes_nothing() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["A"]).await.id();

        let res = app
            .patch_with_token(
                &routes::cat(cat_id),
                &json!({"name": "Murzik", "color": "#123456"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);

        let cat = app.get_with_token(&routes::cat(cat_id), &token).await;
        assert_eq!(cat.body["name"], "Barsik");
        assert_eq!(cat.achievement_names(), vec!["A"]);
    }

    #[tokio::test]
    async fn any_user_may_update_any_cat() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        let cat_id = app.create_cat(&alice, "Barsik", &[]).await.id();

        let res = app
            .patch_with_token(&routes::cat(cat_id), &json!({"name": "Bobcat"}), &bob)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Bobcat");
    }

    #[tokio::test]
    async fn updating_a_missing_cat_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .patch_with_token(&routes::cat(4242), &json!({"name": "Ghost"}), &token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_a_cat_keeps_its_achievements() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let cat_id = app.create_cat(&token, "Barsik", &["Brave"]).await.id();

        let res = app.delete_with_token(&routes::cat(cat_id), &token).await;
        assert_eq!(res.status, 204);

        let gone = app.get_with_token(&routes::cat(cat_id), &token).await;
        assert_eq!(gone.status, 404);

        let links = achievement_cat::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(links, 0);
        let achievements = app.get_with_token(routes::ACHIEVEMENTS, &token).await;
        assert_eq!(achievements.body.as_array().unwrap().len(), 1);
    }
}
