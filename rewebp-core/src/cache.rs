//! Read-through cache invalidation port.
//!
//! The engine never reads through a cache itself; it only signals the
//! owning application's cache after mutating catalog records or stored
//! references.

use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Drop cached state for one catalog item.
    async fn invalidate(&self, id: Uuid);

    /// Drop everything; used after a multi-table reference rewrite,
    /// where the touched entities are not enumerable.
    async fn flush_all(&self);
}

/// Default for deployments without a read-through cache.
#[derive(Debug, Clone, Default)]
pub struct NoopCache;

#[async_trait]
impl EntityCache for NoopCache {
    async fn invalidate(&self, _id: Uuid) {}

    async fn flush_all(&self) {}
}
