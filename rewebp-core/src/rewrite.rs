//! Reference rewriter: keeps stored content consistent with renamed
//! files.

use std::fmt;
use std::sync::Arc;

use rewebp_model::RenameLocatorSet;
use tracing::{debug, info};
use url::Url;

use crate::cache::EntityCache;
use crate::database::ports::ReferenceStore;
use crate::error::Result;

/// Rewrites every textual reference to a renamed file across the
/// content tables, then invalidates the read-through cache.
///
/// Safe to call any number of times for the same rename: once no stored
/// text contains the old locators, the rewrite is a no-op.
#[derive(Clone)]
pub struct ReferenceRewriter {
    store: Arc<dyn ReferenceStore>,
    cache: Arc<dyn EntityCache>,
    base_url: Url,
}

impl fmt::Debug for ReferenceRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceRewriter")
            .field("store", &"dyn ReferenceStore")
            .field("cache", &"dyn EntityCache")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ReferenceRewriter {
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        cache: Arc<dyn EntityCache>,
        base_url: Url,
    ) -> Self {
        Self { store, cache, base_url }
    }

    /// Rewrite all locator forms of a single rename.
    pub async fn rewrite_rename(&self, old_path: &str, new_path: &str) -> Result<u64> {
        let set = RenameLocatorSet::for_rename(&self.base_url, old_path, new_path);
        self.rewrite(&set).await
    }

    /// Apply a prebuilt locator set (the reconciliation pass batches
    /// several renames' pairs into one set).
    pub async fn rewrite(&self, set: &RenameLocatorSet) -> Result<u64> {
        debug!(pairs = set.pairs.len(), "rewriting stored references");
        let touched = self.store.replace_references(&set.pairs).await?;

        // The rewrite touches arbitrary entities; only a full flush is
        // sound. Runs after commit so readers never cache stale text.
        self.cache.flush_all().await;

        if touched > 0 {
            info!(touched, "stored references updated");
        }
        Ok(touched)
    }
}
