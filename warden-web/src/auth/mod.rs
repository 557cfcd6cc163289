//! Request authentication: bearer-token validation and user resolution

pub mod middleware;
pub mod problem;
pub mod validator;

pub use middleware::{api_auth_middleware, ApiAuth, AuthFailure, HEADER_USER_ID, HEADER_USER_USERNAME};
pub use problem::{ProblemDetails, AUTHENTICATION_FAILURE, PROBLEM_CONTENT_TYPE};
pub use validator::{JwtResourceServer, OAuthError, TokenValidator, ValidationError};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller identity attached by [`api_auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    #[schema(example = "b6f1c2d4-7f7e-4a1b-9d55-2f3c4e5a6b7c")]
    pub id: String,
    #[schema(example = "alice")]
    pub username: String,
}

/// Only available on routes behind the authentication middleware
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Route is missing the authentication layer",
            ))
    }
}
