pub mod auth;
pub mod dashboard;
pub mod folder;
pub mod qtree;
pub mod work;

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::{json, Value};

/// `{"success": true, "data": ...}`
pub(crate) fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data
    }))
}

pub(crate) fn created<T: Serialize>(data: T) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, success(data))
}

pub(crate) fn deleted(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message
    }))
}
