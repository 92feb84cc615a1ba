//! Works & Q Trees backend
//!
//! Backend for a writing app that files two kinds of documents into a nested
//! folder tree: free-form rich-text *works* and *q-trees*, question/answer
//! documents that branch into sub-questions.
//!
//! ## Architecture
//!
//! - **Models**: rows, request payloads and the tree builders that turn flat
//!   parent-referencing rows into nested views
//! - **Repositories**: owner-scoped table access, Postgres or in-memory
//! - **Services**: per-family access with cached listings, move rules and a
//!   change event bus
//! - **Handlers**: JSON endpoints in a `{"success", "data"}` envelope
//! - **Middleware**: bearer token gate, request logging, CORS
//! - **Router**: route composition with the protected gate
//!
//! ## Quick Start
//!
//! ```no_run
//! use works_qtree_backend::{app_state::{AppConfig, AppState}, router::create_app_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = AppState::new(AppConfig::from_env()?).await?;
//!     let app = create_app_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod app_state;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;
pub mod shutdown;

pub use app_state::{AppConfig, AppState, DataBackend, Environment};
pub use database::{DatabaseManager, DatabaseStats};
pub use error::{AppError, Result};
