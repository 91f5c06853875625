use serde_json::json;

use crate::common::{PIXEL_PNG, TestApp, png_data_uri, routes};

async fn cat_with_image(app: &TestApp, token: &str) -> String {
    let res = app
        .post_with_token(
            routes::CATS,
            &json!({
                "name": "Barsik",
                "color": "#FFFFFF",
                "birth_year": 2020,
                "image": png_data_uri(PIXEL_PNG),
            }),
            token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    res.body["image_url"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn stored_image_is_served_byte_for_byte() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let image_url = cat_with_image(&app, &token).await;

    let res = app.client.get(app.url(&image_url)).send().await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert!(res.headers().contains_key("etag"));
    let bytes = res.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), PIXEL_PNG);
}

#[tokio::test]
async fn matching_etag_is_not_modified() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let image_url = cat_with_image(&app, &token).await;

    let first = app.client.get(app.url(&image_url)).send().await.unwrap();
    let etag = first.headers()["etag"].clone();

    let second = app
        .client
        .get(app.url(&image_url))
        .header("If-None-Match", etag)
        .send()
        .await
        .unwrap();

    assert_eq!(second.status().as_u16(), 304);
}

#[tokio::test]
async fn same_bytes_share_one_url() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    let first = cat_with_image(&app, &token).await;
    let second = cat_with_image(&app, &token).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_media_path_is_not_found() {
    let app = TestApp::spawn().await;

    let bad_name = app.get_without_token("/media/cats/images/nope.png").await;
    assert_eq!(bad_name.status, 404);

    let missing = app
        .get_without_token(&format!("/media/cats/images/{}.png", "0".repeat(64)))
        .await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn media_is_not_served_outside_debug() {
    let app = TestApp::spawn_with(false).await;
    let token = app.create_authenticated_user("alice", "password123").await;
    let image_url = cat_with_image(&app, &token).await;

    let res = app.get_without_token(&image_url).await;

    assert_eq!(res.status, 404);
}
