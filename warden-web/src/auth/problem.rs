//! Problem-details error bodies

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Suffix appended to the configured base URL for authentication failures
pub const AUTHENTICATION_FAILURE: &str = "request-authentication-failure";

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Structured error body with `type`, `title`, `status` and `detail`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    #[schema(example = "https://api.example.com/problems/request-authentication-failure")]
    pub problem_type: String,
    #[schema(example = "Access Denied")]
    pub title: String,
    #[schema(example = 401)]
    pub status: u16,
    pub detail: String,
}

impl ProblemDetails {
    /// Authentication failure; `base_url` is used verbatim as the type prefix
    pub fn access_denied(base_url: &str, status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: format!("{}{}", base_url, AUTHENTICATION_FAILURE),
            title: "Access Denied".to_string(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE))],
            Json(self),
        )
            .into_response()
    }
}
