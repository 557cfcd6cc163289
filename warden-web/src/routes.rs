//! Route definitions for the Warden web server

use crate::{auth::api_auth_middleware, handlers, openapi, AppState};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Create API routes
///
/// Everything except the health check sits behind bearer-token authentication.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::current_user))
        .route("/access/{resource}", get(handlers::check_access))
        .route("/admin/policies/reload", post(handlers::reload_policies))
        .route_layer(from_fn_with_state(state.auth.clone(), api_auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(protected)
}
