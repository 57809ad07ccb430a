use async_trait::async_trait;
use rewebp_model::LocatorPair;

use crate::error::Result;

/// Transactional substring replacement across every reference-bearing
/// table: document bodies, per-entity metadata, and global settings.
///
/// All pairs of one rename run inside a single transaction; any failure
/// rolls the whole set back, leaving old references fully intact.
/// Replacement is literal substring substitution, so the operation is
/// idempotent: a second call with no matching substrings is a no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Apply every pair across all tables; returns the number of
    /// statements that matched at least one row.
    async fn replace_references(&self, pairs: &[LocatorPair]) -> Result<u64>;
}
