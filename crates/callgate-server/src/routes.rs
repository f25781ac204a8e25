//! Route definitions for the web layer.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/user/login", get(handlers::user_login))
        .route("/user/callback", get(handlers::user_callback))
        .route("/user/success", get(handlers::user_success))
        .route("/admin/login", get(handlers::admin_login))
        .route("/admin/callback", get(handlers::admin_callback))
        .route("/admin/success", get(handlers::admin_success))
        .route("/admin/refresh", get(handlers::admin_refresh))
        .route("/monitoring/start", post(handlers::start_monitoring))
        .route("/location", post(handlers::location_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
