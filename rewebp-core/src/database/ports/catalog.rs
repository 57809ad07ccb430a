use async_trait::async_trait;
use rewebp_model::{CatalogItem, DateFilter};
use uuid::Uuid;

use crate::error::Result;

/// Repository port over the catalog of media items.
///
/// Paging contract: `list_convertible` must return IDs in a stable order
/// (creation order, ties broken by id) so that offset/limit slicing never
/// skips or repeats items while the underlying set is unchanged. A
/// converted item stops matching the predicate and drops out of
/// subsequent pages; the orchestrator is built around that shrinkage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// IDs of items still convertible: MIME in the source set, status
    /// attached, optionally restricted to one creation month.
    /// `limit = -1` means all matching items.
    async fn list_convertible(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<DateFilter>,
    ) -> Result<Vec<Uuid>>;

    /// Count of items matching the convertible predicate.
    async fn count_convertible(&self, filter: Option<DateFilter>) -> Result<i64>;

    /// IDs of already-converted (WebP, attached) items, for the
    /// reference-reconciliation pass. `limit = -1` means all.
    async fn list_converted(&self, limit: i64, offset: i64) -> Result<Vec<Uuid>>;

    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>>;

    /// Update the stored locator and declared MIME type after a
    /// conversion.
    async fn set_locator(&self, id: Uuid, path: &str, mime: &str) -> Result<()>;

    /// Update one size variant's file name after its rename.
    async fn set_size_variant_file(
        &self,
        id: Uuid,
        size_name: &str,
        file: &str,
    ) -> Result<()>;
}
