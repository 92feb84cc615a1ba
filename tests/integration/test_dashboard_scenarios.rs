//! Dashboard walkthroughs: filing documents into folders and browsing them
//! one level at a time.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::{user, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn labels(list: &Value, field: &str) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item[field].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_top_level_dashboard() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let essays = app.folder(&token, "Essays", None).await;
    app.folder(&token, "Drafts", Some(&essays)).await;
    app.post("/api/works", &token, json!({ "title": "Loose notes" })).await;
    app.post("/api/works", &token, json!({ "title": "Filed", "folder_id": essays }))
        .await;
    app.post("/api/qtrees", &token, json!({ "question": "Why Rust?" })).await;

    let (status, body) = app.get("/api/dashboard", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert!(data["folder"].is_null());
    assert_eq!(data["breadcrumbs"], json!([]));
    assert_eq!(labels(&data["folders"], "name"), vec!["Essays"]);
    assert_eq!(labels(&data["works"], "title"), vec!["Loose notes"]);
    assert_eq!(labels(&data["qtrees"], "question"), vec!["Why Rust?"]);
}

#[tokio::test]
async fn test_folder_dashboard_with_breadcrumbs() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let essays = app.folder(&token, "Essays", None).await;
    let drafts = app.folder(&token, "Drafts", Some(&essays)).await;
    app.folder(&token, "Scraps", Some(&drafts)).await;
    app.post("/api/works", &token, json!({ "title": "Intro", "folder_id": drafts }))
        .await;
    app.post("/api/qtrees", &token, json!({ "question": "Outline?", "folder_id": drafts }))
        .await;
    app.post("/api/works", &token, json!({ "title": "Elsewhere" })).await;

    let (status, body) = app.get(&format!("/api/dashboard?folder_id={}", drafts), &token).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["folder"]["name"], "Drafts");
    assert_eq!(labels(&data["breadcrumbs"], "name"), vec!["Essays", "Drafts"]);
    assert_eq!(labels(&data["folders"], "name"), vec!["Scraps"]);
    assert_eq!(labels(&data["works"], "title"), vec!["Intro"]);
    assert_eq!(labels(&data["qtrees"], "question"), vec!["Outline?"]);
}

#[tokio::test]
async fn test_dashboard_filter_and_sort() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    for title in ["zebra notes", "Alpha notes", "groceries", "Mid NOTES"] {
        app.post("/api/works", &token, json!({ "title": title })).await;
    }
    app.folder(&token, "Notes archive", None).await;
    app.folder(&token, "Photos", None).await;

    let (status, body) = app.get("/api/dashboard?q=notes&sort=title", &token).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(
        labels(&data["works"], "title"),
        vec!["Alpha notes", "Mid NOTES", "zebra notes"]
    );
    assert_eq!(labels(&data["folders"], "name"), vec!["Notes archive"]);
    assert_eq!(data["qtrees"], json!([]));
}

#[tokio::test]
async fn test_unknown_sort_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let (status, _) = app.get("/api/dashboard?sort=size", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_folder_redirects_home() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let (status, body) = app
        .get(&format!("/api/dashboard?folder_id={}", Uuid::new_v4()), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["redirect"], "/");
}

#[tokio::test]
async fn test_dashboard_follows_moves() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let essays = app.folder(&token, "Essays", None).await;
    let (_, created) = app.post("/api/works", &token, json!({ "title": "Wanderer" })).await;
    let work_id = created["data"]["id"].as_str().unwrap().to_string();

    // Warm both scopes.
    app.get("/api/dashboard", &token).await;
    app.get(&format!("/api/dashboard?folder_id={}", essays), &token).await;

    let (status, _) = app
        .patch(&format!("/api/works/{}/move", work_id), &token, json!({ "destination_id": essays }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, top) = app.get("/api/dashboard", &token).await;
    assert_eq!(top["data"]["works"], json!([]));

    let (_, inside) = app.get(&format!("/api/dashboard?folder_id={}", essays), &token).await;
    assert_eq!(labels(&inside["data"]["works"], "title"), vec!["Wanderer"]);
}

#[tokio::test]
async fn test_deleting_folder_clears_its_dashboard() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let essays = app.folder(&token, "Essays", None).await;
    app.post("/api/works", &token, json!({ "title": "Doomed", "folder_id": essays }))
        .await;
    app.get(&format!("/api/dashboard?folder_id={}", essays), &token).await;

    let (status, _) = app.delete(&format!("/api/folders/{}", essays), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/dashboard?folder_id={}", essays), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, top) = app.get("/api/dashboard", &token).await;
    assert_eq!(top["data"]["folders"], json!([]));
    assert_eq!(top["data"]["works"], json!([]));
}
