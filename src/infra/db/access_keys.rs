use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AccessKeysRepo, CreateAccessKeyParams, RepoError};
use crate::domain::access::{AccessKeyRecord, Role};

use super::{PostgresRepositories, map_sqlx_error};

const KEY_COLUMNS: &str =
    "id, name, prefix, hashed_secret, role, revoked_at, last_used_at, created_at";

#[derive(Debug, FromRow)]
struct AccessKeyRow {
    id: Uuid,
    name: String,
    prefix: String,
    hashed_secret: Vec<u8>,
    role: Role,
    revoked_at: Option<OffsetDateTime>,
    last_used_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl From<AccessKeyRow> for AccessKeyRecord {
    fn from(row: AccessKeyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            role: row.role,
            revoked_at: row.revoked_at,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AccessKeysRepo for PostgresRepositories {
    async fn create_key(
        &self,
        params: CreateAccessKeyParams,
    ) -> Result<AccessKeyRecord, RepoError> {
        let sql = format!(
            "INSERT INTO access_keys (id, name, prefix, hashed_secret, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {KEY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccessKeyRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.name)
            .bind(params.prefix)
            .bind(params.hashed_secret)
            .bind(params.role)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AccessKeyRecord>, RepoError> {
        let sql = format!("SELECT {KEY_COLUMNS} FROM access_keys WHERE prefix = $1");
        let row = sqlx::query_as::<_, AccessKeyRow>(&sql)
            .bind(prefix)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(AccessKeyRecord::from))
    }

    async fn revoke_by_prefix(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE access_keys SET revoked_at = COALESCE(revoked_at, $2) WHERE prefix = $1",
        )
        .bind(prefix)
        .bind(at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE access_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
