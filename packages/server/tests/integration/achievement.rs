use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn achievements_list_is_a_plain_array() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let first = app.create_achievement(&token, "Brave").await;
    let second = app.create_achievement(&token, "Curious").await;

    let res = app.get_with_token(routes::ACHIEVEMENTS, &token).await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.body,
        json!([
            {"id": first, "achievement_name": "Brave"},
            {"id": second, "achievement_name": "Curious"},
        ])
    );
}

#[tokio::test]
async fn anonymous_user_cannot_list_achievements() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ACHIEVEMENTS).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    app.create_achievement(&token, "Brave").await;

    let res = app
        .post_with_token(
            routes::ACHIEVEMENTS,
            &json!({"achievement_name": "Brave"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    let res = app
        .post_with_token(routes::ACHIEVEMENTS, &json!({"achievement_name": "  "}), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "achievement_name");
}

#[tokio::test]
async fn achievement_can_be_renamed() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let id = app.create_achievement(&token, "Brave").await;

    let put = app
        .put_with_token(
            &routes::achievement(id),
            &json!({"achievement_name": "Braver"}),
            &token,
        )
        .await;
    assert_eq!(put.status, 200, "{}", put.text);
    assert_eq!(put.body["achievement_name"], "Braver");

    let patch = app
        .patch_with_token(&routes::achievement(id), &json!({}), &token)
        .await;
    assert_eq!(patch.status, 200);
    assert_eq!(patch.body["achievement_name"], "Braver");

    let get = app.get_with_token(&routes::achievement(id), &token).await;
    assert_eq!(get.body["achievement_name"], "Braver");
}

#[tokio::test]
async fn renaming_onto_an_existing_name_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    app.create_achievement(&token, "Brave").await;
    let id = app.create_achievement(&token, "Curious").await;

    let res = app
        .patch_with_token(
            &routes::achievement(id),
            &json!({"achievement_name": "Brave"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn renamed_achievement_shows_on_cats() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let cat = app.create_cat(&token, "Barsik", &["Brave"]).await;
    let achievement_id = cat.body["achievements"][0]["id"].as_i64().unwrap() as i32;

    app.patch_with_token(
        &routes::achievement(achievement_id),
        &json!({"achievement_name": "Fearless"}),
        &token,
    )
    .await;

    let res = app.get_with_token(&routes::cat(cat.id()), &token).await;
    assert_eq!(res.achievement_names(), vec!["Fearless"]);
}

#[tokio::test]
async fn deleting_an_achievement_unlinks_it_from_every_cat() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let first = app.create_cat(&token, "Barsik", &["Brave", "Curious"]).await;
    let second = app.create_cat(&token, "Murzik", &["Brave"]).await;
    let brave_id = first.body["achievements"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .delete_with_token(&routes::achievement(brave_id), &token)
        .await;
    assert_eq!(res.status, 204);

    let first = app.get_with_token(&routes::cat(first.id()), &token).await;
    assert_eq!(first.achievement_names(), vec!["Curious"]);
    let second = app.get_with_token(&routes::cat(second.id()), &token).await;
    assert!(second.achievement_names().is_empty());

    let missing = app.get_with_token(&routes::achievement(brave_id), &token).await;
    assert_eq!(missing.status, 404);
}
