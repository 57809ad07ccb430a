//! Single-item conversion: transcode one catalogued image to WebP and
//! keep the catalog, storage, and stored references consistent.

use std::fmt;
use std::sync::Arc;

use rewebp_model::{
    CatalogItem, ConversionResult, SourceFormat, WEBP_MIME, relative_locator,
    replace_extension,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::EntityCache;
use crate::codec::ImageCodec;
use crate::database::ports::CatalogPort;
use crate::error::{ConvertError, Result};
use crate::rewrite::ReferenceRewriter;
use crate::storage::Storage;

#[derive(Clone)]
pub struct ItemConverter {
    catalog: Arc<dyn CatalogPort>,
    storage: Arc<dyn Storage>,
    codec: Arc<dyn ImageCodec>,
    rewriter: ReferenceRewriter,
    cache: Arc<dyn EntityCache>,
    quality: f32,
}

impl fmt::Debug for ItemConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemConverter")
            .field("catalog", &"dyn CatalogPort")
            .field("storage", &"dyn Storage")
            .field("codec", &"dyn ImageCodec")
            .field("rewriter", &self.rewriter)
            .field("quality", &self.quality)
            .finish()
    }
}

impl ItemConverter {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        storage: Arc<dyn Storage>,
        codec: Arc<dyn ImageCodec>,
        rewriter: ReferenceRewriter,
        cache: Arc<dyn EntityCache>,
        quality: f32,
    ) -> Self {
        Self { catalog, storage, codec, rewriter, cache, quality }
    }

    /// Convert one catalogued image to WebP.
    ///
    /// On success the catalog locator and MIME are updated, size
    /// variants are converted best-effort, and stored references are
    /// rewritten unless `skip_references` is set. A failed reference
    /// rewrite does not undo the conversion; the result message records
    /// it and `rewrite_all_references` is the recovery path.
    pub async fn convert(
        &self,
        id: Uuid,
        skip_references: bool,
    ) -> Result<ConversionResult> {
        let item = self
            .catalog
            .get_item(id)
            .await?
            .ok_or_else(|| {
                ConvertError::NotFound(format!("No catalog record for item {id}"))
            })?;

        if !self.storage.exists(&item.path).await {
            return Err(ConvertError::NotFound(format!(
                "Source file missing: {}",
                item.path
            )));
        }

        let format = SourceFormat::from_mime(&item.mime).ok_or_else(|| {
            ConvertError::AlreadyConverted(format!(
                "Item {id} is already WebP or not a convertible image ({})",
                item.mime
            ))
        })?;

        let new_path = replace_extension(&item.path).ok_or_else(|| {
            ConvertError::AlreadyConverted(format!(
                "Locator has no convertible extension: {}",
                item.path
            ))
        })?;

        // A destination left behind by an earlier partial run means the
        // pixels are already converted; reuse it instead of invoking the
        // codec again.
        let reused = self.storage.exists(&new_path).await;
        if reused {
            debug!(item = %id, path = %new_path, "destination exists, reusing");
        } else {
            let bytes = self
                .codec
                .transcode(&self.storage.resolve(&item.path), format, self.quality)
                .await?;
            self.storage.write(&new_path, &bytes).await?;
        }

        // Source removal is best-effort; a leftover source only costs
        // disk space and is picked up by the reuse path on retry.
        if let Err(e) = self.storage.delete(&item.path).await {
            warn!(item = %id, path = %item.path, error = %e, "failed to delete source file");
        }

        self.catalog.set_locator(id, &new_path, WEBP_MIME).await?;

        self.convert_size_variants(&item).await;

        let mut message = if reused {
            "Destination already existed, source removed".to_string()
        } else {
            "Image converted successfully".to_string()
        };

        if !skip_references {
            if let Err(e) = self.rewriter.rewrite_rename(&item.path, &new_path).await {
                // Conversion already committed; references are stale but
                // detectable. rewrite_all_references reconciles later.
                warn!(item = %id, error = %e, "reference rewrite failed after conversion");
                message = format!("{message}; reference rewrite failed: {e}");
            }
        }

        self.cache.invalidate(id).await;

        info!(item = %id, old = %item.path, new = %new_path, reused, "item converted");

        Ok(ConversionResult {
            id,
            success: true,
            old_locator: Some(relative_locator(&item.path)),
            new_locator: Some(relative_locator(&new_path)),
            message,
        })
    }

    /// Convert the item's size renditions, tolerating individual
    /// failures: a broken thumbnail never fails the parent item.
    async fn convert_size_variants(&self, item: &CatalogItem) {
        for size in &item.sizes {
            let Some(new_file) = replace_extension(&size.file) else {
                continue;
            };
            let old_rel = item.sibling_path(&size.file);
            let new_rel = item.sibling_path(&new_file);

            if self.storage.exists(&new_rel).await {
                if self.storage.exists(&old_rel).await
                    && let Err(e) = self.storage.delete(&old_rel).await
                {
                    warn!(item = %item.id, size = %size.name, error = %e, "failed to delete stale size file");
                }
            } else if self.storage.exists(&old_rel).await {
                let format = size
                    .file
                    .rsplit_once('.')
                    .and_then(|(_, ext)| SourceFormat::from_extension(ext));
                let Some(format) = format else {
                    continue;
                };

                let converted: Result<()> = async {
                    let bytes = self
                        .codec
                        .transcode(&self.storage.resolve(&old_rel), format, self.quality)
                        .await?;
                    self.storage.write(&new_rel, &bytes).await?;
                    self.storage.delete(&old_rel).await
                }
                .await;

                if let Err(e) = converted {
                    warn!(item = %item.id, size = %size.name, error = %e, "size variant conversion failed");
                    continue;
                }
            } else {
                debug!(item = %item.id, size = %size.name, "size file missing, skipping");
                continue;
            }

            if let Err(e) = self
                .catalog
                .set_size_variant_file(item.id, &size.name, &new_file)
                .await
            {
                warn!(item = %item.id, size = %size.name, error = %e, "failed to record size rename");
            }
        }
    }
}
