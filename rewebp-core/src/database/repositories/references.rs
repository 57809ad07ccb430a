use async_trait::async_trait;
use rewebp_model::LocatorPair;
use sqlx::PgPool;
use tracing::debug;

use crate::database::ports::ReferenceStore;
use crate::error::{ConvertError, Result};

/// Postgres adapter for the reference-bearing tables.
///
/// One rename is one transaction: every `REPLACE()` statement for every
/// locator pair commits together or not at all. The `LIKE` guards keep
/// the updates from touching (and bloating the WAL with) rows that do
/// not reference the file.
#[derive(Debug, Clone)]
pub struct PostgresReferenceStore {
    pool: PgPool,
}

impl PostgresReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceStore for PostgresReferenceStore {
    async fn replace_references(&self, pairs: &[LocatorPair]) -> Result<u64> {
        if pairs.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            ConvertError::ReferenceRewriteFailed(format!(
                "Failed to start transaction: {e}"
            ))
        })?;

        let mut touched = 0u64;
        for pair in pairs {
            let like = format!("%{}%", escape_like(&pair.old));

            let res = sqlx::query(
                r#"
                UPDATE documents
                SET body = REPLACE(body, $1, $2),
                    summary = REPLACE(summary, $1, $2)
                WHERE body LIKE $3 OR summary LIKE $3
                "#,
            )
            .bind(&pair.old)
            .bind(&pair.new)
            .bind(&like)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ConvertError::ReferenceRewriteFailed(format!(
                    "Failed to rewrite document references: {e}"
                ))
            })?;
            touched += u64::from(res.rows_affected() > 0);

            let res = sqlx::query(
                r#"
                UPDATE entity_meta
                SET meta_value = REPLACE(meta_value, $1, $2)
                WHERE meta_value LIKE $3
                "#,
            )
            .bind(&pair.old)
            .bind(&pair.new)
            .bind(&like)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ConvertError::ReferenceRewriteFailed(format!(
                    "Failed to rewrite metadata references: {e}"
                ))
            })?;
            touched += u64::from(res.rows_affected() > 0);

            let res = sqlx::query(
                r#"
                UPDATE app_settings
                SET value = REPLACE(value, $1, $2)
                WHERE value LIKE $3
                "#,
            )
            .bind(&pair.old)
            .bind(&pair.new)
            .bind(&like)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ConvertError::ReferenceRewriteFailed(format!(
                    "Failed to rewrite settings references: {e}"
                ))
            })?;
            touched += u64::from(res.rows_affected() > 0);
        }

        tx.commit().await.map_err(|e| {
            ConvertError::ReferenceRewriteFailed(format!(
                "Failed to commit reference rewrite: {e}"
            ))
        })?;

        debug!(pairs = pairs.len(), touched, "rewrote stored references");
        Ok(touched)
    }
}

/// Escape `LIKE` metacharacters so locators match literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
