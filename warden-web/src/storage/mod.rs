//! SQLite-backed storage: connection setup, schema and repositories

pub mod loaders;
pub mod tokens;
pub mod users;

pub use loaders::{AdminResourceAuthLoader, UserAuthLoader};
pub use tokens::SqliteTokenRepository;
pub use users::{MemoryUserRepository, SqliteUserRepository};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};
use warden_core::{ErrorContext, WardenError, WardenResult};

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL DEFAULT '',
            can_login INTEGER NOT NULL DEFAULT 1,
            deleted_at TEXT
        )
        "#,
    ),
    (
        "api_clients",
        r#"
        CREATE TABLE IF NOT EXISTS api_clients (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            description TEXT NOT NULL DEFAULT '',
            secret TEXT NOT NULL DEFAULT '',
            deleted_at TEXT
        )
        "#,
    ),
    (
        "user_groups",
        r#"
        CREATE TABLE IF NOT EXISTS user_groups (
            id TEXT PRIMARY KEY,
            identifier TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            deleted_at TEXT
        )
        "#,
    ),
    (
        "users_user_groups",
        r#"
        CREATE TABLE IF NOT EXISTS users_user_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id),
            user_group_id TEXT NOT NULL REFERENCES user_groups(id)
        )
        "#,
    ),
    (
        "admin_resources",
        r#"
        CREATE TABLE IF NOT EXISTS admin_resources (
            id TEXT PRIMARY KEY,
            identifier TEXT UNIQUE NOT NULL,
            deleted_at TEXT
        )
        "#,
    ),
    (
        "user_groups_admin_resources",
        r#"
        CREATE TABLE IF NOT EXISTS user_groups_admin_resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_group_id TEXT NOT NULL REFERENCES user_groups(id),
            admin_resource_id TEXT NOT NULL REFERENCES admin_resources(id)
        )
        "#,
    ),
    (
        "tokens",
        r#"
        CREATE TABLE IF NOT EXISTS tokens (
            id TEXT PRIMARY KEY,
            api_client_id TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            revoked_at TEXT
        )
        "#,
    ),
];

/// Open a pool for `database_url`.
///
/// In-memory databases live and die with their connection, so they get a single
/// connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> WardenResult<SqlitePool> {
    info!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| database_error("connect", e))?
        .create_if_missing(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| database_error("connect", e))
}

/// Create every table the authentication and authorization layers read
pub async fn create_schema(pool: &SqlitePool) -> WardenResult<()> {
    for (table, ddl) in SCHEMA {
        debug!("Creating table {}", table);
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| database_error("create_schema", e))?;
    }

    info!(tables = SCHEMA.len(), "Database schema ready");
    Ok(())
}

/// Convert a driver error, keeping the database error code when there is one
pub(crate) fn database_error(operation: &str, e: sqlx::Error) -> WardenError {
    let code = match &e {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    };

    WardenError::Storage {
        message: format!("{} failed: {}", operation, e),
        code,
        source: Some(Box::new(e)),
        context: ErrorContext::new("storage").with_operation(operation),
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:", 1).await.unwrap();
    create_schema(&pool).await.unwrap();
    pool
}
