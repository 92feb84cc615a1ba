//! Contract tests for q-tree roots and nodes.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::{user, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_root(app: &TestApp, token: &str, question: &str) -> String {
    let (status, body) = app.post("/api/qtrees", token, json!({ "question": question })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_node(app: &TestApp, token: &str, root: &str, parent: Value) -> (StatusCode, Value) {
    app.post(&format!("/api/qtrees/{}/nodes", root), token, parent).await
}

#[tokio::test]
async fn test_root_lifecycle() {
    let app = TestApp::spawn().await;
    let (_, token) = user();

    let (status, _) = app.post("/api/qtrees", &token, json!({ "question": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let root = create_root(&app, &token, "Why learn Rust?").await;

    let answer = json!({ "type": "doc", "content": [{ "type": "text", "text": "Ownership" }] });
    let (status, body) = app
        .patch(&format!("/api/qtrees/{}", root), &token, json!({ "answer": answer }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["question"], "Why learn Rust?");

    let (_, body) = app.get("/api/qtrees", &token).await;
    assert_eq!(body["data"][0]["preview"], "Ownership");

    let (status, body) = app
        .patch(&format!("/api/qtrees/{}/rename", root), &token, json!({ "question": "Why Rust?" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["question"], "Why Rust?");

    let (status, _) = app.delete(&format!("/api/qtrees/{}", root), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/api/qtrees/{}", root), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["redirect"], "/");
}

#[tokio::test]
async fn test_tree_view_nests_nodes() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let root = create_root(&app, &token, "Root question").await;

    let (status, first) = create_node(&app, &token, &root, json!({ "parent_root_id": root, "question": "First" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let first_id = first["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(first["data"]["parent_root_id"], root.as_str());
    assert!(first["data"]["parent_node_id"].is_null());

    let (_, nested) = create_node(
        &app,
        &token,
        &root,
        json!({ "parent_node_id": first_id, "question": "Nested" }),
    )
    .await;
    let nested_id = nested["data"]["id"].as_str().unwrap().to_string();
    create_node(&app, &token, &root, json!({ "parent_root_id": root, "question": "Second" })).await;

    let (status, body) = app.get(&format!("/api/qtrees/{}/tree", root), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["root"]["id"], root.as_str());
    assert_eq!(body["data"]["preview"], "");

    let nodes = body["data"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["question"], "First");
    assert_eq!(nodes[0]["children"][0]["question"], "Nested");
    assert_eq!(
        nodes[0]["children"][0]["editor_path"],
        format!("/qtree/{}/node/{}", root, nested_id)
    );
    assert_eq!(nodes[1]["question"], "Second");
}

#[tokio::test]
async fn test_node_parent_validation() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let root = create_root(&app, &token, "A").await;
    let other = create_root(&app, &token, "B").await;
    let (_, foreign) = create_node(&app, &token, &other, json!({ "parent_root_id": other })).await;
    let foreign_id = foreign["data"]["id"].as_str().unwrap();

    let (status, _) = create_node(&app, &token, &root, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_node(
        &app,
        &token,
        &root,
        json!({ "parent_root_id": root, "parent_node_id": foreign_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_node(&app, &token, &root, json!({ "parent_root_id": other })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_node(&app, &token, &root, json!({ "parent_node_id": foreign_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_node(&app, &token, &root, json!({ "parent_node_id": Uuid::new_v4() })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = Uuid::new_v4();
    let (status, _) = create_node(&app, &token, &missing.to_string(), json!({ "parent_root_id": missing })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_editor_and_subtree_delete() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let root = create_root(&app, &token, "Q").await;
    let (_, a) = create_node(&app, &token, &root, json!({ "parent_root_id": root, "question": "a" })).await;
    let a = a["data"]["id"].as_str().unwrap().to_string();
    let (_, b) = create_node(&app, &token, &root, json!({ "parent_node_id": a, "question": "b" })).await;
    let b = b["data"]["id"].as_str().unwrap().to_string();

    let node_uri = format!("/api/qtrees/{}/nodes/{}", root, b);
    let (status, body) = app
        .patch(&node_uri, &token, json!({ "question": "b, revised" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["question"], "b, revised");

    let (status, body) = app.get(&node_uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["qtree_root_id"], root.as_str());

    let (status, _) = app.delete(&format!("/api/qtrees/{}/nodes/{}", root, a), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&node_uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["redirect"], format!("/qtree/{}", root));

    let (_, body) = app.get(&format!("/api/qtrees/{}/tree", root), &token).await;
    assert_eq!(body["data"]["nodes"], json!([]));
}

#[tokio::test]
async fn test_move_qtree_into_folder() {
    let app = TestApp::spawn().await;
    let (_, token) = user();
    let folder = app.folder(&token, "Study", None).await;
    let root = create_root(&app, &token, "Q").await;

    let (status, body) = app
        .patch(&format!("/api/qtrees/{}/move", root), &token, json!({ "destination_id": folder }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["folder_id"], folder.as_str());

    let (_, body) = app.get(&format!("/api/qtrees?folder_id={}", folder), &token).await;
    assert_eq!(body["data"][0]["id"], root.as_str());
}
