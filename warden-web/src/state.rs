//! Application state shared by every request

use crate::{
    auth::{ApiAuth, JwtResourceServer, TokenValidator},
    authz::{Authorizer, GrantKind},
    storage::{
        self, AdminResourceAuthLoader, SqliteTokenRepository, SqliteUserRepository,
        UserAuthLoader,
    },
    WebConfig, WebError, WebResult,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;
use warden_core::{AccessTokenRepository, GrantPolicyAdapter, OAuth2Config, PolicyAdapter};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    pub pool: SqlitePool,
    /// Authentication applied to protected routes
    pub auth: ApiAuth,
    pub authorizer: Arc<Authorizer>,
}

impl AppState {
    /// Connect storage, create the schema and load policies
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        info!("Initializing application state");

        let pool = storage::connect(&config.database_url, config.max_connections).await?;
        storage::create_schema(&pool).await?;

        let tokens: Arc<dyn AccessTokenRepository> =
            Arc::new(SqliteTokenRepository::new(pool.clone()));
        let validator = build_validator(&config.oauth2, tokens)?;
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let auth = ApiAuth::new(validator, users, config.problem_base_url.clone());

        let adapters: Vec<(GrantKind, Arc<dyn PolicyAdapter>)> = vec![
            (
                GrantKind::Membership,
                Arc::new(GrantPolicyAdapter::new(
                    "user_groups",
                    Arc::new(UserAuthLoader::new(pool.clone())),
                )),
            ),
            (
                GrantKind::Resource,
                Arc::new(GrantPolicyAdapter::new(
                    "admin_resources",
                    Arc::new(AdminResourceAuthLoader::new(pool.clone())),
                )),
            ),
        ];
        let authorizer = Arc::new(Authorizer::load(adapters).await?);

        info!("Application state initialized");
        Ok(Self::from_parts(config, pool, auth, authorizer))
    }

    /// Assemble state from prebuilt collaborators
    pub fn from_parts(
        config: WebConfig,
        pool: SqlitePool,
        auth: ApiAuth,
        authorizer: Arc<Authorizer>,
    ) -> Self {
        Self {
            config,
            pool,
            auth,
            authorizer,
        }
    }

    /// In-memory state verifying HS256 tokens signed with `test-secret`
    #[cfg(test)]
    pub(crate) async fn for_tests() -> Self {
        let mut config = WebConfig::default();
        config.oauth2.jwt_secret = Some("test-secret".to_string());
        Self::new(config).await.unwrap()
    }
}

/// Pick the token verifier from the configured key source
fn build_validator(
    oauth2: &OAuth2Config,
    tokens: Arc<dyn AccessTokenRepository>,
) -> WebResult<Arc<dyn TokenValidator>> {
    let server = match (&oauth2.public_key_path, &oauth2.jwt_secret) {
        (Some(path), None) => {
            let pem = std::fs::read(path).map_err(|e| {
                WebError::Config(format!("Failed to read OAuth2 public key {}: {}", path, e))
            })?;
            JwtResourceServer::from_rsa_pem(&pem, tokens)?
        }
        (None, Some(secret)) => JwtResourceServer::from_secret(secret.as_bytes(), tokens),
        (Some(_), Some(_)) => {
            return Err(WebError::Config(
                "OAuth2 public key and JWT secret are mutually exclusive".to_string(),
            ))
        }
        (None, None) => {
            return Err(WebError::Config(
                "Either an OAuth2 public key or a JWT secret is required".to_string(),
            ))
        }
    };

    Ok(Arc::new(server.with_leeway(oauth2.leeway_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_requires_key_source() {
        let result = AppState::new(WebConfig::default()).await;
        assert!(matches!(result, Err(WebError::Config(_))));
    }

    #[tokio::test]
    async fn test_state_rejects_both_key_sources() {
        let mut config = WebConfig::default();
        config.oauth2.jwt_secret = Some("secret".to_string());
        config.oauth2.public_key_path = Some("/nonexistent.pem".to_string());

        let result = AppState::new(config).await;
        assert!(matches!(result, Err(WebError::Config(_))));
    }

    #[tokio::test]
    async fn test_state_starts_with_empty_policies() {
        let state = AppState::for_tests().await;
        assert_eq!(state.authorizer.grant_count().await, 0);
    }
}
