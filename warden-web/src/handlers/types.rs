//! Request/response types used by the handlers

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Outcome of an access check for the calling user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    #[schema(example = "alice")]
    pub subject: String,
    #[schema(example = "users")]
    pub resource: String,
    #[schema(example = true)]
    pub allowed: bool,
}

/// Result of a policy reload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    /// Grant entries now loaded, duplicates included
    #[schema(example = 42)]
    pub grants: usize,
    pub reloaded_at: chrono::DateTime<chrono::Utc>,
}

/// Error body for non-authentication failures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "forbidden")]
    pub error: String,
    pub message: String,
}
