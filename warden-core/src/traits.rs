//! Core trait definitions

use crate::error::WardenResult;
use crate::types::*;
use async_trait::async_trait;

/// Query collaborator returning every stored grant row
#[async_trait]
pub trait AuthLoader: Send + Sync {
    /// Fetch all grant rows in storage order
    async fn load_all(&self) -> WardenResult<Vec<GrantRow>>;
}

/// User lookup used during request authentication
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> WardenResult<Option<User>>;

    /// Find the user owning the given API client
    async fn get_by_client_id(&self, client_id: &str) -> WardenResult<Option<User>>;
}

/// Issued-token state consulted by the resource server
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Whether the token with the given id has been revoked
    async fn is_revoked(&self, token_id: &str) -> WardenResult<bool>;
}
