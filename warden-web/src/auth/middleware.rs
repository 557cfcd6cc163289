//! API authentication middleware

use super::{
    problem::ProblemDetails,
    validator::{OAuthError, TokenValidator, ValidationError},
    AuthenticatedUser,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use warden_core::{User, UserRepository};

pub const HEADER_USER_ID: &str = "xxx-user-id";
pub const HEADER_USER_USERNAME: &str = "xxx-user-username";

/// Detail returned for every server-side failure
const UNKNOWN_ERROR: &str = "unknown_error";

/// Why a request was not authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// The client's credentials were refused
    #[error("request rejected: {0}")]
    Rejected(OAuthError),
    /// Authentication could not complete
    #[error("authentication failed internally: {0}")]
    Internal(String),
}

impl AuthFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::Rejected(e) => e.status,
            AuthFailure::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem(&self, base_url: &str) -> ProblemDetails {
        let detail = match self {
            AuthFailure::Rejected(e) => e.message.clone(),
            AuthFailure::Internal(_) => UNKNOWN_ERROR.to_string(),
        };
        ProblemDetails::access_denied(base_url, self.status(), detail)
    }
}

impl From<ValidationError> for AuthFailure {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::OAuth(e) => AuthFailure::Rejected(e),
            ValidationError::Unexpected(message) => AuthFailure::Internal(message),
        }
    }
}

/// Token validation plus user resolution, shared by every protected route
#[derive(Clone)]
pub struct ApiAuth {
    validator: Arc<dyn TokenValidator>,
    users: Arc<dyn UserRepository>,
    problem_base_url: String,
}

impl ApiAuth {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        users: Arc<dyn UserRepository>,
        problem_base_url: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            users,
            problem_base_url: problem_base_url.into(),
        }
    }

    pub fn problem_base_url(&self) -> &str {
        &self.problem_base_url
    }

    /// Validate the bearer token and resolve its owner
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthFailure> {
        let attributes = self.validator.validate(headers).await?;

        let user = self
            .find_user(
                attributes.user_id.as_deref(),
                attributes.client_id.as_deref(),
            )
            .await?;
        let user = match user {
            Some(user) => user,
            None => {
                return Err(AuthFailure::Internal(format!(
                    "no user for token {} (user_id={:?}, client_id={:?})",
                    attributes.access_token_id, attributes.user_id, attributes.client_id
                )))
            }
        };

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
        })
    }

    async fn find_user(
        &self,
        user_id: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<Option<User>, AuthFailure> {
        if let Some(id) = user_id.filter(|id| !id.is_empty()) {
            let found = self
                .users
                .get_by_id(id)
                .await
                .map_err(|e| AuthFailure::Internal(format!("user lookup failed: {}", e)))?;
            if found.is_some() {
                return Ok(found);
            }
        }

        match client_id.filter(|id| !id.is_empty()) {
            Some(id) => self
                .users
                .get_by_client_id(id)
                .await
                .map_err(|e| AuthFailure::Internal(format!("client lookup failed: {}", e))),
            None => Ok(None),
        }
    }
}

/// Reject unauthenticated requests with a problem-details body; otherwise
/// attach the caller as an [`AuthenticatedUser`] and pass the request on.
pub async fn api_auth_middleware(
    State(auth): State<ApiAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match auth.authenticate(request.headers()).await {
        Ok(user) => user,
        Err(failure) => {
            match &failure {
                AuthFailure::Rejected(e) => {
                    debug!(
                        path = %request.uri().path(),
                        error = %e.error_type,
                        hint = e.hint.as_deref().unwrap_or(""),
                        "Request authentication denied"
                    );
                }
                AuthFailure::Internal(cause) => {
                    error!(path = %request.uri().path(), "Request authentication error: {}", cause);
                }
            }
            return failure.to_problem(auth.problem_base_url()).into_response();
        }
    };

    // Client-supplied identity headers are always replaced.
    let headers = request.headers_mut();
    headers.remove(HEADER_USER_ID);
    headers.remove(HEADER_USER_USERNAME);
    if let Ok(value) = HeaderValue::from_str(&user.id) {
        headers.insert(HeaderName::from_static(HEADER_USER_ID), value);
    }
    if let Ok(value) = HeaderValue::from_str(&user.username) {
        headers.insert(HeaderName::from_static(HEADER_USER_USERNAME), value);
    }

    debug!(user_id = %user.id, "Request authenticated");
    request.extensions_mut().insert(user);
    next.run(request).await
}
