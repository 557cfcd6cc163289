//! Grant-row queries feeding the policy adapters

use super::database_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use warden_core::{AuthLoader, GrantRow, WardenResult};

const ADMIN_RESOURCE_GRANTS: &str = "SELECT ug.identifier AS v0, ar.identifier AS v1 \
    FROM user_groups_admin_resources AS ugar \
    INNER JOIN admin_resources AS ar ON ugar.admin_resource_id = ar.id AND ar.deleted_at IS NULL \
    INNER JOIN user_groups AS ug ON ugar.user_group_id = ug.id AND ug.deleted_at IS NULL";

const USER_GROUP_MEMBERSHIPS: &str = "SELECT u.username AS v0, ug.identifier AS v1 \
    FROM users_user_groups AS uug \
    INNER JOIN users AS u ON uug.user_id = u.id AND u.deleted_at IS NULL \
    INNER JOIN user_groups AS ug ON uug.user_group_id = ug.id AND ug.deleted_at IS NULL";

#[derive(Debug, sqlx::FromRow)]
struct GrantRecord {
    v0: String,
    v1: String,
}

impl From<GrantRecord> for GrantRow {
    fn from(record: GrantRecord) -> Self {
        GrantRow::new(record.v0, record.v1)
    }
}

async fn fetch_grants(pool: &SqlitePool, sql: &str, operation: &str) -> WardenResult<Vec<GrantRow>> {
    let records = sqlx::query_as::<_, GrantRecord>(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| database_error(operation, e))?;

    debug!(operation, rows = records.len(), "Fetched grant rows");
    Ok(records.into_iter().map(GrantRow::from).collect())
}

/// User group → admin resource grants, skipping soft-deleted groups and resources
#[derive(Debug, Clone)]
pub struct AdminResourceAuthLoader {
    pool: SqlitePool,
}

impl AdminResourceAuthLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthLoader for AdminResourceAuthLoader {
    async fn load_all(&self) -> WardenResult<Vec<GrantRow>> {
        fetch_grants(&self.pool, ADMIN_RESOURCE_GRANTS, "load_admin_resource_grants").await
    }
}

/// Username → user group memberships, skipping soft-deleted users and groups
#[derive(Debug, Clone)]
pub struct UserAuthLoader {
    pool: SqlitePool,
}

impl UserAuthLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthLoader for UserAuthLoader {
    async fn load_all(&self) -> WardenResult<Vec<GrantRow>> {
        fetch_grants(&self.pool, USER_GROUP_MEMBERSHIPS, "load_user_group_memberships").await
    }
}
