//! Caller identity and access checks

use super::types::AccessResponse;
use crate::{
    auth::{AuthenticatedUser, ProblemDetails},
    AppState, WebResult,
};
use axum::{
    extract::{Path, State},
    response::Json,
};

/// Current user
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Access",
    summary = "Current user",
    description = "Identity resolved from the bearer token",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = AuthenticatedUser),
        (status = 401, description = "Token rejected", body = ProblemDetails, content_type = "application/problem+json"),
        (status = 500, description = "Token owner could not be resolved", body = ProblemDetails, content_type = "application/problem+json")
    )
)]
pub async fn current_user(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

/// Check access to an admin resource
#[utoipa::path(
    get,
    path = "/api/access/{resource}",
    tag = "Access",
    summary = "Check resource access",
    description = "Whether the calling user reaches the admin resource through one of their user groups",
    security(("bearer_auth" = [])),
    params(
        ("resource" = String, Path, description = "Admin resource identifier")
    ),
    responses(
        (status = 200, description = "Access decision", body = AccessResponse),
        (status = 401, description = "Token rejected", body = ProblemDetails, content_type = "application/problem+json")
    )
)]
pub async fn check_access(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(resource): Path<String>,
) -> WebResult<Json<AccessResponse>> {
    let allowed = state.authorizer.is_allowed(&user.username, &resource).await?;

    Ok(Json(AccessResponse {
        subject: user.username,
        resource,
        allowed,
    }))
}
