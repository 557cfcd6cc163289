//! Issued access-token state

use super::database_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use warden_core::{AccessTokenRepository, WardenResult};

/// Token table used for revocation checks
#[derive(Debug, Clone)]
pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an issued token
    pub async fn record(
        &self,
        token_id: &str,
        api_client_id: &str,
        expires_at: DateTime<Utc>,
    ) -> WardenResult<()> {
        sqlx::query("INSERT INTO tokens (id, api_client_id, expires_at) VALUES (?, ?, ?)")
            .bind(token_id)
            .bind(api_client_id)
            .bind(expires_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("record_token", e))?;

        Ok(())
    }

    /// Mark a token revoked. Returns false when no live token matched.
    pub async fn revoke(&self, token_id: &str) -> WardenResult<bool> {
        let result =
            sqlx::query("UPDATE tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
                .bind(Utc::now().to_rfc3339())
                .bind(token_id)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("revoke_token", e))?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!(token_id, "Access token revoked");
        }
        Ok(revoked)
    }
}

#[async_trait]
impl AccessTokenRepository for SqliteTokenRepository {
    /// Tokens without a row are not considered revoked.
    async fn is_revoked(&self, token_id: &str) -> WardenResult<bool> {
        let revoked_at: Option<Option<String>> =
            sqlx::query_scalar("SELECT revoked_at FROM tokens WHERE id = ?")
                .bind(token_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("is_token_revoked", e))?;

        Ok(matches!(revoked_at, Some(Some(_))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revocation_lifecycle() {
        let repo = SqliteTokenRepository::new(test_pool().await);
        repo.record("t1", "c1", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(!repo.is_revoked("t1").await.unwrap());
        assert!(repo.revoke("t1").await.unwrap());
        assert!(repo.is_revoked("t1").await.unwrap());
        // Second revoke is a no-op
        assert!(!repo.revoke("t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_revoked() {
        let repo = SqliteTokenRepository::new(test_pool().await);
        assert!(!repo.is_revoked("never-issued").await.unwrap());
    }
}
