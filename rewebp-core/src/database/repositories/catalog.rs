use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewebp_model::{
    CatalogItem, DateFilter, ItemStatus, SizeVariant, SourceFormat, WEBP_MIME,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::database::ports::CatalogPort;
use crate::error::{ConvertError, Result};

/// Postgres adapter for the media-item catalog.
#[derive(Debug, Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn source_mimes() -> Vec<String> {
        SourceFormat::all_mimes()
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    fn filter_bounds(
        filter: Option<DateFilter>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match filter.and_then(|f| f.month_bounds()) {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        }
    }

    fn map_item_row(row: &PgRow) -> Result<CatalogItem> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| ConvertError::Database(format!("Failed to read item id: {e}")))?;
        let path: String = row
            .try_get("file_path")
            .map_err(|e| ConvertError::Database(format!("Failed to read file path: {e}")))?;
        let mime: String = row
            .try_get("mime_type")
            .map_err(|e| ConvertError::Database(format!("Failed to read mime type: {e}")))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| ConvertError::Database(format!("Failed to read status: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| ConvertError::Database(format!("Failed to read created_at: {e}")))?;

        let status = match status.as_str() {
            "attached" => ItemStatus::Attached,
            _ => ItemStatus::Detached,
        };

        Ok(CatalogItem {
            id,
            path,
            mime,
            status,
            created_at,
            sizes: Vec::new(),
        })
    }
}

#[async_trait]
impl CatalogPort for PostgresCatalogRepository {
    async fn list_convertible(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<DateFilter>,
    ) -> Result<Vec<Uuid>> {
        let (from, to) = Self::filter_bounds(filter);
        // A null limit disables the clause, covering the `-1 = all`
        // contract without a second query string.
        let limit = (limit >= 0).then_some(limit);

        let rows = sqlx::query(
            r#"
            SELECT id
            FROM media_items
            WHERE mime_type = ANY($1)
              AND status = 'attached'
              AND ($2::timestamptz IS NULL
                   OR (created_at >= $2 AND created_at < $3))
            ORDER BY created_at, id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(Self::source_mimes())
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            ConvertError::Database(format!("Failed to list convertible items: {e}"))
        })?;

        rows.iter()
            .map(|row| {
                row.try_get("id").map_err(|e| {
                    ConvertError::Database(format!("Failed to read item id: {e}"))
                })
            })
            .collect()
    }

    async fn count_convertible(&self, filter: Option<DateFilter>) -> Result<i64> {
        let (from, to) = Self::filter_bounds(filter);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM media_items
            WHERE mime_type = ANY($1)
              AND status = 'attached'
              AND ($2::timestamptz IS NULL
                   OR (created_at >= $2 AND created_at < $3))
            "#,
        )
        .bind(Self::source_mimes())
        .bind(from)
        .bind(to)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            ConvertError::Database(format!("Failed to count convertible items: {e}"))
        })?;

        row.try_get("total")
            .map_err(|e| ConvertError::Database(format!("Failed to read count: {e}")))
    }

    async fn list_converted(&self, limit: i64, offset: i64) -> Result<Vec<Uuid>> {
        let limit = (limit >= 0).then_some(limit);

        let rows = sqlx::query(
            r#"
            SELECT id
            FROM media_items
            WHERE mime_type = $1
              AND status = 'attached'
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(WEBP_MIME)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            ConvertError::Database(format!("Failed to list converted items: {e}"))
        })?;

        rows.iter()
            .map(|row| {
                row.try_get("id").map_err(|e| {
                    ConvertError::Database(format!("Failed to read item id: {e}"))
                })
            })
            .collect()
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, file_path, mime_type, status, created_at
            FROM media_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ConvertError::Database(format!("Failed to get item: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut item = Self::map_item_row(&row)?;

        let size_rows = sqlx::query(
            r#"
            SELECT size_name, file_name
            FROM media_size_variants
            WHERE item_id = $1
            ORDER BY size_name
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            ConvertError::Database(format!("Failed to list size variants: {e}"))
        })?;

        for row in &size_rows {
            let name: String = row.try_get("size_name").map_err(|e| {
                ConvertError::Database(format!("Failed to read size name: {e}"))
            })?;
            let file: String = row.try_get("file_name").map_err(|e| {
                ConvertError::Database(format!("Failed to read size file: {e}"))
            })?;
            item.sizes.push(SizeVariant { name, file });
        }

        Ok(Some(item))
    }

    async fn set_locator(&self, id: Uuid, path: &str, mime: &str) -> Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE media_items
            SET file_path = $2, mime_type = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(path)
        .bind(mime)
        .execute(self.pool())
        .await
        .map_err(|e| ConvertError::Database(format!("Failed to update locator: {e}")))?;

        if res.rows_affected() == 0 {
            return Err(ConvertError::NotFound(format!(
                "No catalog record for item {id}"
            )));
        }
        Ok(())
    }

    async fn set_size_variant_file(
        &self,
        id: Uuid,
        size_name: &str,
        file: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE media_size_variants
            SET file_name = $3
            WHERE item_id = $1 AND size_name = $2
            "#,
        )
        .bind(id)
        .bind(size_name)
        .bind(file)
        .execute(self.pool())
        .await
        .map_err(|e| {
            ConvertError::Database(format!("Failed to update size variant: {e}"))
        })?;
        Ok(())
    }
}
