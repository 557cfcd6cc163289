//! Core data type definitions

use serde::{Deserialize, Serialize};

/// A stored permission pair: subject `v0` is granted `v1`.
///
/// For group grants `v0` is a user-group identifier and `v1` an admin-resource
/// identifier; for memberships `v0` is a username and `v1` a user-group identifier.
/// Storage does not enforce uniqueness, duplicates are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantRow {
    pub v0: String,
    pub v1: String,
}

impl GrantRow {
    pub fn new(v0: impl Into<String>, v1: impl Into<String>) -> Self {
        Self {
            v0: v0.into(),
            v1: v1.into(),
        }
    }
}

/// Local user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub can_login: bool,
}

/// API client credentials owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClient {
    pub id: String,
    pub user_id: String,
    pub description: String,
}

/// Attributes extracted from a validated bearer token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAttributes {
    /// Token identifier (`jti`)
    pub access_token_id: String,
    /// Client the token was issued to (`aud`)
    pub client_id: Option<String>,
    /// Resource owner (`sub`), absent for client-credentials tokens
    pub user_id: Option<String>,
    pub scopes: Vec<String>,
}
