use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{self, AppState};

/// API routes without transport layers. `main` wraps these with rate
/// limiting, body limits, tracing and CORS; tests drive them directly.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/requests", post(handlers::submit_request))
        .route("/api/v1/services", get(handlers::list_services))
        .route("/api/v1/admin/requests", get(handlers::list_requests))
        .route(
            "/api/v1/admin/requests/:id",
            get(handlers::get_request)
                .patch(handlers::update_request)
                .delete(handlers::delete_request),
        )
}

/// Full application router with the health check.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
}
