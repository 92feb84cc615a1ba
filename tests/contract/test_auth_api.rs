//! Contract tests for sign-up, sign-in, session and sign-out.

#[path = "../common/mod.rs"]
mod common;

use axum::http::{Method, StatusCode};
use common::{mint_token, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let app = TestApp::spawn().await;
    let credentials = json!({ "email": "writer@example.com", "password": "secret1" });

    let (status, body) = app
        .request(Method::POST, "/api/auth/signup", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let user_id = body["data"]["user_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::POST, "/api/auth/signin", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], user_id.as_str());

    // The issued token opens the protected routes
    let token = body["data"]["access_token"].as_str().unwrap();
    let (status, _) = app.get("/api/folders", token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_sign_up_surfaces_provider_message() {
    let app = TestApp::spawn().await;
    let credentials = json!({ "email": "writer@example.com", "password": "secret1" });

    app.request(Method::POST, "/api/auth/signup", None, Some(credentials.clone()))
        .await;
    let (status, body) = app
        .request(Method::POST, "/api/auth/signup", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already registered");
}

#[tokio::test]
async fn test_credentials_are_validated_locally() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signin",
            None,
            Some(json!({ "email": "not-an-email", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "writer@example.com", "password": "12345" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 6"));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::spawn().await;
    app.request(
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": "writer@example.com", "password": "secret1" })),
    )
    .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signin",
            None,
            Some(json!({ "email": "writer@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid login credentials");
}

#[tokio::test]
async fn test_session_reports_signed_in_user() {
    let app = TestApp::spawn().await;

    let (status, body) = app.request(Method::GET, "/api/auth/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["user_id"].is_null());

    let (_, body) = app
        .request(Method::GET, "/api/auth/session", Some("expired-or-garbage"), None)
        .await;
    assert!(body["data"]["user_id"].is_null());

    let user_id = Uuid::new_v4();
    let token = mint_token(user_id, "writer@example.com");
    let (_, body) = app.request(Method::GET, "/api/auth/session", Some(&token), None).await;
    assert_eq!(body["data"]["user_id"], user_id.to_string());
    assert_eq!(body["data"]["email"], "writer@example.com");
}

#[tokio::test]
async fn test_sign_out_requires_token_and_forwards_it() {
    let app = TestApp::spawn().await;

    let (status, _) = app.request(Method::POST, "/api/auth/signout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = mint_token(Uuid::new_v4(), "writer@example.com");
    let (status, body) = app.request(Method::POST, "/api/auth/signout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(*app.identity.signed_out.lock().unwrap(), vec![token]);
}
