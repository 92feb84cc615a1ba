pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{auth_middleware, optional_auth_middleware, AccessToken};
pub use cors::cors_layer;
pub use logging::request_logging_middleware;
