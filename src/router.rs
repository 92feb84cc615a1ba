use crate::{
    app_state::AppState,
    handlers::{auth, dashboard, folder, qtree, work},
    health,
    middleware::{auth_middleware, cors_layer, optional_auth_middleware, request_logging_middleware},
};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(health_routes())
        .nest("/api", public_routes(&state).merge(protected_routes(&state)))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::basic_health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/detailed", get(health::detailed_health_check))
}

fn public_routes(state: &AppState) -> Router<AppState> {
    let session = Router::new()
        .route("/auth/session", get(auth::get_session))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            optional_auth_middleware,
        ));

    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .merge(session)
}

/// Everything behind the auth gate.
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/signout", post(auth::sign_out))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/folders", get(folder::list_folders).post(folder::create_folder))
        .route("/folders/tree", get(folder::get_folder_tree))
        .route("/folders/move-destinations", get(folder::get_move_destinations))
        .route(
            "/folders/:id",
            get(folder::get_folder)
                .patch(folder::rename_folder)
                .delete(folder::delete_folder),
        )
        .route("/folders/:id/move", patch(folder::move_folder))
        .route("/folders/:id/breadcrumbs", get(folder::get_folder_breadcrumbs))
        .route("/works", get(work::list_works).post(work::create_work))
        .route(
            "/works/:id",
            get(work::get_work).patch(work::update_work).delete(work::delete_work),
        )
        .route("/works/:id/rename", patch(work::rename_work))
        .route("/works/:id/move", patch(work::move_work))
        .route("/qtrees", get(qtree::list_qtrees).post(qtree::create_qtree))
        .route(
            "/qtrees/:id",
            get(qtree::get_qtree)
                .patch(qtree::update_qtree)
                .delete(qtree::delete_qtree),
        )
        .route("/qtrees/:id/rename", patch(qtree::rename_qtree))
        .route("/qtrees/:id/move", patch(qtree::move_qtree))
        .route("/qtrees/:id/tree", get(qtree::get_qtree_view))
        .route("/qtrees/:id/nodes", post(qtree::create_node))
        .route(
            "/qtrees/:id/nodes/:node_id",
            get(qtree::get_node).patch(qtree::update_node).delete(qtree::delete_node),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            auth_middleware,
        ))
}
