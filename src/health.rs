use crate::app_state::{get_uptime_seconds, AppState, DataBackend};
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

pub async fn basic_health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Backend reachability, host and build information.
pub async fn detailed_health_check(State(app_state): State<AppState>) -> (StatusCode, Json<Value>) {
    let health = app_state.health_check().await;
    let status_code = if health.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let stats = match &app_state.backend {
        DataBackend::Postgres(db) => db.stats().await.ok().map(|stats| json!(stats)),
        DataBackend::Memory(_) => None,
    };

    (
        status_code,
        Json(json!({
            "health": health,
            "database_stats": stats
        })),
    )
}

pub async fn liveness_check() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": get_uptime_seconds()
    }))
}

pub async fn readiness_check(State(app_state): State<AppState>) -> (StatusCode, Json<Value>) {
    let ready = app_state.backend.ping().await.is_ok();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if ready { "ready" } else { "not_ready" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "checks": {
                "data_service": ready
            }
        })),
    )
}
