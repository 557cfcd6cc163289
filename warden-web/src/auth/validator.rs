//! Bearer-token validation (OAuth2 resource server)

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use warden_core::{AccessTokenRepository, ErrorContext, TokenAttributes, WardenError, WardenResult};

const ACCESS_DENIED: &str = "access_denied";
const ACCESS_DENIED_MESSAGE: &str =
    "The resource owner or authorization server denied the request.";

/// OAuth2 error raised by the resource server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct OAuthError {
    pub status: StatusCode,
    /// OAuth2 error code, e.g. `access_denied`
    pub error_type: String,
    pub message: String,
    pub hint: Option<String>,
}

impl OAuthError {
    pub fn new(status: StatusCode, error_type: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.to_string(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn access_denied(hint: &str) -> Self {
        Self {
            hint: Some(hint.to_string()),
            ..Self::new(StatusCode::UNAUTHORIZED, ACCESS_DENIED, ACCESS_DENIED_MESSAGE)
        }
    }
}

/// Failure modes of a token validator
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The token was rejected
    #[error(transparent)]
    OAuth(#[from] OAuthError),
    /// Validation itself broke, e.g. the revocation store is unreachable
    #[error("unexpected validation failure: {0}")]
    Unexpected(String),
}

/// Validates the credentials carried by a request
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, headers: &HeaderMap) -> Result<TokenAttributes, ValidationError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn first(self) -> Option<String> {
        match self {
            Audience::One(aud) => Some(aud),
            Audience::Many(auds) => auds.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    jti: String,
    #[serde(default)]
    aud: Option<Audience>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
}

/// JWT access-token validator backed by the issued-token table
pub struct JwtResourceServer {
    decoding_key: DecodingKey,
    validation: Validation,
    tokens: Arc<dyn AccessTokenRepository>,
}

impl JwtResourceServer {
    /// RS256 tokens signed by the authorization server's private key
    pub fn from_rsa_pem(pem: &[u8], tokens: Arc<dyn AccessTokenRepository>) -> WardenResult<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(pem).map_err(|e| WardenError::Config {
            message: format!("Invalid OAuth2 public key: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("resource_server")
                .with_operation("load_public_key")
                .with_suggestion("Check that the key is a PEM encoded RSA public key"),
        })?;

        Ok(Self::with_key(decoding_key, Algorithm::RS256, tokens))
    }

    /// HS256 tokens signed with a shared secret
    pub fn from_secret(secret: &[u8], tokens: Arc<dyn AccessTokenRepository>) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256, tokens)
    }

    fn with_key(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        tokens: Arc<dyn AccessTokenRepository>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        // The audience is the client id, resolved afterwards rather than pinned here.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            decoding_key,
            validation,
            tokens,
        }
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    fn bearer_token(headers: &HeaderMap) -> Result<&str, OAuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| OAuthError::access_denied("Missing \"Authorization\" header"))?
            .to_str()
            .map_err(|_| OAuthError::access_denied("Malformed \"Authorization\" header"))?;

        // `Bearer` followed by any single whitespace character; a bare token is accepted too.
        let header = header.trim_start();
        let token = match header.strip_prefix("Bearer") {
            Some(rest) if rest.starts_with(char::is_whitespace) => rest,
            _ => header,
        }
        .trim();

        if token.is_empty() {
            return Err(OAuthError::access_denied("Missing bearer token"));
        }

        Ok(token)
    }

    fn decode_claims(&self, token: &str) -> Result<AccessTokenClaims, OAuthError> {
        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        OAuthError::access_denied("Access token has expired")
                    }
                    ErrorKind::ImmatureSignature => {
                        OAuthError::access_denied("Access token is not valid yet")
                    }
                    ErrorKind::InvalidSignature => {
                        OAuthError::access_denied("Access token could not be verified")
                    }
                    _ => OAuthError::access_denied("Access token is malformed"),
                }
            })
    }
}

#[async_trait]
impl TokenValidator for JwtResourceServer {
    async fn validate(&self, headers: &HeaderMap) -> Result<TokenAttributes, ValidationError> {
        let token = Self::bearer_token(headers)?;
        let claims = self.decode_claims(token)?;

        let revoked = self
            .tokens
            .is_revoked(&claims.jti)
            .await
            .map_err(|e| ValidationError::Unexpected(e.to_string()))?;
        if revoked {
            return Err(OAuthError::access_denied("Access token has been revoked").into());
        }

        Ok(TokenAttributes {
            access_token_id: claims.jti,
            client_id: claims.aud.and_then(Audience::first).filter(|id| !id.is_empty()),
            user_id: claims.sub.filter(|id| !id.is_empty()),
            scopes: claims.scopes,
        })
    }
}
