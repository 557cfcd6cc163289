//! OpenAPI specification for the Warden admin API

use axum::response::Json;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{AuthenticatedUser, ProblemDetails},
    handlers::{AccessResponse, ErrorResponse, HealthResponse, ReloadResponse},
};

/// Main OpenAPI specification for the Warden web server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warden API",
        version = "0.1.0",
        description = "Bearer-token authentication and grant-based authorization for the admin API",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::handlers::current_user,
        crate::handlers::check_access,
        crate::handlers::reload_policies,
    ),
    components(
        schemas(
            HealthResponse,
            AccessResponse,
            ReloadResponse,
            ErrorResponse,
            AuthenticatedUser,
            ProblemDetails,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Access", description = "Caller identity and access checks"),
        (name = "Policies", description = "Authorization policy administration"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security configuration for the API
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
