use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";
const RESPONSE_TIME: &str = "x-response-time";
const SLOW_REQUEST_MS: u128 = 1000;

/// Logs every request with its outcome and tags the response with a request
/// id and the time taken. An incoming `x-request-id` is reused.
pub async fn request_logging_middleware(mut req: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = req
        .headers()
        .get(REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().clone();
    let uri = req.uri().clone();
    let client_ip = get_client_ip(req.headers());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        req.headers_mut().insert(REQUEST_ID, value);
    }

    debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        user_agent = %req.headers().get("user-agent").and_then(|h| h.to_str().ok()).unwrap_or("unknown"),
        "Request started"
    );

    let mut response = next.run(req).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", duration.as_millis())) {
        response.headers_mut().insert(RESPONSE_TIME, value);
    }

    let duration_ms = duration.as_millis();
    match status.as_u16() {
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            client_ip = %client_ip,
            "Request completed with server error"
        ),
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            client_ip = %client_ip,
            "Request completed with client error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            client_ip = %client_ip,
            "Request completed"
        ),
    }

    if duration_ms > SLOW_REQUEST_MS {
        warn!(request_id = %request_id, method = %method, uri = %uri, duration_ms, "Slow request detected");
    }

    if status == StatusCode::UNAUTHORIZED && uri.path().starts_with("/api/auth/signin") {
        warn!(client_ip = %client_ip, "Failed sign-in attempt");
    }

    response
}

/// Client address as reported by a fronting proxy, if any.
fn get_client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return real_ip.to_string();
    }

    "unknown".to_string()
}
