//! HTTP API route definitions.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::docs::openapi_json;
use super::handlers::{
    create_account, delete_account, health, index, list_accounts, method_not_allowed,
    read_account, render_metrics, route_not_found, update_account, AppState,
};
use super::security;
use crate::metrics::track_requests;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Service endpoints
        .route("/", get(index).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/metrics", get(render_metrics).fallback(method_not_allowed))
        .route("/api-docs/openapi.json", get(openapi_json).fallback(method_not_allowed))
        // Account resource
        .route(
            "/accounts",
            post(create_account)
                .get(list_accounts)
                .fallback(method_not_allowed),
        )
        .route(
            "/accounts/:id",
            get(read_account)
                .put(update_account)
                .delete(delete_account)
                .fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(middleware::from_fn(track_requests));

    security::apply(router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
