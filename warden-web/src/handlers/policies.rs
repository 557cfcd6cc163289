//! Policy administration handlers

use super::types::{ErrorResponse, ReloadResponse};
use crate::{auth::AuthenticatedUser, AppState, WebError, WebResult};
use axum::{extract::State, response::Json};
use tracing::info;

/// Admin resource guarding policy administration
pub const ADMIN_POLICY_RESOURCE: &str = "admin-policies";

/// Reload authorization policies
#[utoipa::path(
    post,
    path = "/api/admin/policies/reload",
    tag = "Policies",
    summary = "Reload policies",
    description = "Re-read every grant from storage and replace the active policies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Policies reloaded", body = ReloadResponse),
        (status = 403, description = "Caller may not administer policies", body = ErrorResponse),
        (status = 500, description = "Grants could not be loaded", body = ErrorResponse)
    )
)]
pub async fn reload_policies(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> WebResult<Json<ReloadResponse>> {
    if !state
        .authorizer
        .is_allowed(&user.username, ADMIN_POLICY_RESOURCE)
        .await?
    {
        return Err(WebError::Forbidden(format!(
            "User '{}' may not administer policies",
            user.username
        )));
    }

    info!("Reloading policies (requested by {})", user.username);
    let grants = state.authorizer.reload().await?;

    Ok(Json(ReloadResponse {
        grants,
        reloaded_at: chrono::Utc::now(),
    }))
}
