//! Postgres-backed credential store

use super::{CredentialRecord, CredentialStore, StoreError, UpsertOutcome};
use async_trait::async_trait;
use sqlx::PgPool;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Credential store over the `credentials` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT username, password_hash
            FROM credentials
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(record)
    }

    async fn upsert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        if self.lookup(username).await?.is_some() {
            return Ok(UpsertOutcome::AlreadyExists);
        }

        sqlx::query(
            r#"
            INSERT INTO credentials (username, password_hash)
            VALUES ($1, $2)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(UpsertOutcome::Created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db_err.message().to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}
