//! Contract tests for the works endpoints.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::{user, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn doc(text: &str) -> Value {
    json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
    })
}

#[tokio::test]
async fn test_create_work_defaults() {
    let app = TestApp::spawn().await;
    let (user_id, token) = user();

    let (status, body) = app.post("/api/works", &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], "Untitled");
    assert_eq!(body["data"]["content"], json!({}));
    assert_eq!(body["data"]["user_id"], user_id.to_string());
    assert!(body["data"]["folder_id"].is_null());
}

#[tokio::test]
async fn test_create_work_in_folder() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let folder = app.folder(&token, "Essays", None).await;

    let (status, body) = app
        .post("/api/works", &token, json!({ "title": "On Rust", "folder_id": folder }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["folder_id"], folder.as_str());

    let (status, _) = app
        .post("/api/works", &token, json!({ "title": "Lost", "folder_id": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_content_and_listing_preview() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let (_, body) = app.post("/api/works", &token, json!({ "title": "Draft" })).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let long = "word ".repeat(40);
    let (status, body) = app
        .patch(&format!("/api/works/{}", id), &token, json!({ "content": doc(&long) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Draft");

    let (_, body) = app.get("/api/works", &token).await;
    let preview = body["data"][0]["preview"].as_str().unwrap();
    assert_eq!(preview.chars().count(), 81);
    assert!(preview.ends_with('…'));
    assert!(body["data"][0].get("content").is_none());
}

#[tokio::test]
async fn test_rename_rejects_blank_title() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let (_, body) = app.post("/api/works", &token, json!({ "title": "Old" })).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .patch(&format!("/api/works/{}/rename", id), &token, json!({ "title": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch(&format!("/api/works/{}/rename", id), &token, json!({ "title": "New" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "New");
}

#[tokio::test]
async fn test_missing_work_redirects_home() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let (status, body) = app.get(&format!("/api/works/{}", Uuid::new_v4()), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["redirect"], "/");
}

#[tokio::test]
async fn test_move_work_between_scopes() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let folder = app.folder(&token, "Box", None).await;
    let (_, body) = app.post("/api/works", &token, json!({ "title": "Loose" })).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Prime both listings
    let (_, top) = app.get("/api/works?top_level=true", &token).await;
    assert_eq!(top["data"].as_array().unwrap().len(), 1);
    let (_, inside) = app.get(&format!("/api/works?folder_id={}", folder), &token).await;
    assert_eq!(inside["data"].as_array().unwrap().len(), 0);

    let (status, body) = app
        .patch(&format!("/api/works/{}/move", id), &token, json!({ "destination_id": folder }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["folder_id"], folder.as_str());

    let (_, top) = app.get("/api/works?top_level=true", &token).await;
    assert_eq!(top["data"].as_array().unwrap().len(), 0);
    let (_, inside) = app.get(&format!("/api/works?folder_id={}", folder), &token).await;
    assert_eq!(inside["data"][0]["id"], id.as_str());

    let (status, _) = app
        .patch(&format!("/api/works/{}/move", id), &token, json!({ "destination_id": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_work() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let (_, body) = app.post("/api/works", &token, json!({})).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.delete(&format!("/api/works/{}", id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.get(&format!("/api/works/{}", id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/works/{}", id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folder_delete_drops_cached_works() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let folder = app.folder(&token, "Doomed", None).await;
    app.post("/api/works", &token, json!({ "title": "Inside", "folder_id": folder }))
        .await;

    let (_, all) = app.get("/api/works", &token).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    app.delete(&format!("/api/folders/{}", folder), &token).await;

    let (_, all) = app
        .get_until("/api/works", &token, |_, body| body["data"] == json!([]))
        .await;
    assert_eq!(all["data"], json!([]));
}

#[tokio::test]
async fn test_data_service_outage_is_bad_gateway() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    app.store.set_unavailable(true);
    let (status, body) = app.get("/api/works", &token).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}
