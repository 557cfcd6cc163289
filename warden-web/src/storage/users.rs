//! User lookup backends

use super::database_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use warden_core::{ApiClient, User, UserRepository, WardenResult};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: String,
    username: String,
    email: String,
    can_login: bool,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            email: record.email,
            can_login: record.can_login,
        }
    }
}

/// Database-backed user repository
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user row
    pub async fn create_user(&self, user: &User) -> WardenResult<()> {
        sqlx::query("INSERT INTO users (id, username, email, can_login) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.can_login)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("create_user", e))?;

        Ok(())
    }

    /// Insert an API client owned by an existing user
    pub async fn create_api_client(&self, client: &ApiClient) -> WardenResult<()> {
        sqlx::query("INSERT INTO api_clients (id, user_id, description) VALUES (?, ?, ?)")
            .bind(&client.id)
            .bind(&client.user_id)
            .bind(&client.description)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("create_api_client", e))?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_by_id(&self, id: &str) -> WardenResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, can_login FROM users WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("get_user_by_id", e))?;

        Ok(record.map(User::from))
    }

    async fn get_by_client_id(&self, client_id: &str) -> WardenResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.username, u.email, u.can_login FROM users AS u \
             INNER JOIN api_clients AS ac ON ac.user_id = u.id AND ac.deleted_at IS NULL \
             WHERE ac.id = ? AND u.deleted_at IS NULL",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("get_user_by_client_id", e))?;

        Ok(record.map(User::from))
    }
}

/// In-memory user repository (for development and testing)
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
    // client id -> user id
    clients: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn insert_api_client(&self, client: ApiClient) {
        self.clients
            .write()
            .await
            .insert(client.id, client.user_id);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get_by_id(&self, id: &str) -> WardenResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_by_client_id(&self, client_id: &str) -> WardenResult<Option<User>> {
        let user_id = match self.clients.read().await.get(client_id) {
            Some(user_id) => user_id.clone(),
            None => return Ok(None),
        };

        self.get_by_id(&user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_pool;

    fn alice() -> User {
        User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            can_login: true,
        }
    }

    fn client(id: &str, user_id: &str) -> ApiClient {
        ApiClient {
            id: id.to_string(),
            user_id: user_id.to_string(),
            description: "ci".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_lookup_by_id_and_client() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&alice()).await.unwrap();
        repo.create_api_client(&client("c1", "u1")).await.unwrap();

        assert_eq!(repo.get_by_id("u1").await.unwrap(), Some(alice()));
        assert_eq!(repo.get_by_client_id("c1").await.unwrap(), Some(alice()));
        assert_eq!(repo.get_by_id("missing").await.unwrap(), None);
        assert_eq!(repo.get_by_client_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_skips_deleted_rows() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool.clone());
        repo.create_user(&alice()).await.unwrap();
        repo.create_api_client(&client("c1", "u1")).await.unwrap();

        sqlx::query("UPDATE api_clients SET deleted_at = '2024-01-01' WHERE id = 'c1'")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(repo.get_by_client_id("c1").await.unwrap(), None);

        sqlx::query("UPDATE users SET deleted_at = '2024-01-01' WHERE id = 'u1'")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(repo.get_by_id("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_lookup_by_client() {
        let repo = MemoryUserRepository::new();
        repo.insert_user(alice()).await;
        repo.insert_api_client(client("c1", "u1")).await;
        repo.insert_api_client(client("orphan", "nobody")).await;

        assert_eq!(repo.get_by_client_id("c1").await.unwrap(), Some(alice()));
        assert_eq!(repo.get_by_client_id("orphan").await.unwrap(), None);
        assert_eq!(repo.get_by_client_id("unknown").await.unwrap(), None);
    }
}
