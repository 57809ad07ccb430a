//! Batch orchestrator: the resumable pagination/timeout loop.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rewebp_model::{
    BatchReport, BatchRequest, ConversionResult, DateFilter, ReconcileReport,
    RenameLocatorSet, SourceFormat, WEBP_EXTENSION,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConverterConfig;
use crate::convert::ItemConverter;
use crate::database::ports::CatalogPort;
use crate::error::Result;
use crate::rewrite::ReferenceRewriter;
use crate::storage::Storage;

/// Drives whole-catalog conversion as a sequence of short, independent,
/// budgeted calls.
///
/// The orchestrator is stateless across calls: the caller keeps the
/// cursor (`next_offset` from the previous report) and keeps calling
/// until `completed` is true. Calls must be serialized; overlapping
/// batches against the same catalog scope are not supported.
#[derive(Clone)]
pub struct BatchOrchestrator {
    catalog: Arc<dyn CatalogPort>,
    storage: Arc<dyn Storage>,
    converter: ItemConverter,
    rewriter: ReferenceRewriter,
    config: ConverterConfig,
}

impl fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("catalog", &"dyn CatalogPort")
            .field("storage", &"dyn Storage")
            .field("converter", &self.converter)
            .field("config", &self.config)
            .finish()
    }
}

impl BatchOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        storage: Arc<dyn Storage>,
        converter: ItemConverter,
        rewriter: ReferenceRewriter,
        config: ConverterConfig,
    ) -> Self {
        Self { catalog, storage, converter, rewriter, config }
    }

    /// Total convertible items; `filter` overrides the configured
    /// year/month restriction when given.
    pub async fn get_count(&self, filter: Option<DateFilter>) -> Result<i64> {
        self.catalog
            .count_convertible(filter.or(self.config.date_filter))
            .await
    }

    /// Process one page of convertible items against the wall-clock
    /// budget and report a resumption cursor.
    ///
    /// The page is always taken from the head of the current convertible
    /// set: converted items stop matching the predicate, so the head is
    /// always the oldest unconverted item and `req.offset` is purely a
    /// progress counter (`next_offset = offset + processed`). Items that
    /// fail stay in the set; a page that yields only errors therefore
    /// reports completion rather than looping. Callers should keep
    /// `batch_size` at or above the number of persistently failing items.
    ///
    /// A single item's failure never aborts the batch; call-level faults
    /// (the catalog query itself failing) propagate as `Err` with no
    /// partial report.
    pub async fn run_batch(&self, req: BatchRequest) -> Result<BatchReport> {
        let start = Instant::now();
        let budget = req.time_budget.unwrap_or_else(|| self.config.time_budget());
        let batch_size = if req.batch_size == 0 {
            self.config.batch_size
        } else {
            req.batch_size
        };
        let filter = self.config.date_filter;

        let page = self
            .catalog
            .list_convertible(batch_size as i64, 0, filter)
            .await?;

        if page.is_empty() {
            return Ok(BatchReport {
                processed: 0,
                converted: 0,
                errors: 0,
                results: Vec::new(),
                next_offset: req.offset,
                has_more: false,
                completed: true,
                timed_out: false,
                message: "All images have been converted".to_string(),
            });
        }

        let mut converted = 0usize;
        let mut errors = 0usize;
        let mut results: Vec<ConversionResult> = Vec::new();

        for (index, id) in page.iter().copied().enumerate() {
            if start.elapsed() >= budget {
                info!(
                    processed = index,
                    converted,
                    errors,
                    "budget exhausted, returning partial batch"
                );
                return Ok(BatchReport {
                    processed: index,
                    converted,
                    errors,
                    results,
                    next_offset: req.offset + index,
                    has_more: true,
                    completed: false,
                    timed_out: true,
                    message: format!(
                        "Processed {index} images before timeout. Converted: {converted}, Errors: {errors}"
                    ),
                });
            }

            match self.converter.convert(id, req.skip_references).await {
                Ok(result) => {
                    converted += 1;
                    if req.verbose {
                        results.push(result);
                    }
                }
                Err(e) => {
                    if e.is_benign() {
                        debug!(item = %id, error = %e, "item skipped");
                    } else {
                        warn!(item = %id, error = %e, "item conversion failed");
                    }
                    errors += 1;
                    results.push(ConversionResult::failure(id, e.to_string()));
                }
            }
        }

        let processed = page.len();
        let remaining = self.catalog.count_convertible(filter).await?;
        // Failed items are still in the set; only count work beyond them.
        let has_more = remaining > errors as i64;

        Ok(BatchReport {
            processed,
            converted,
            errors,
            results,
            next_offset: req.offset + processed,
            has_more,
            completed: !has_more,
            timed_out: false,
            message: format!(
                "Processed {processed} images. Converted: {converted}, Errors: {errors}"
            ),
        })
    }

    /// Convert one identified item synchronously, always updating
    /// references.
    pub async fn convert_one(&self, id: Uuid) -> ConversionResult {
        match self.converter.convert(id, false).await {
            Ok(result) => result,
            Err(e) => {
                warn!(item = %id, error = %e, "single-item conversion failed");
                ConversionResult::failure(id, e.to_string())
            }
        }
    }

    /// Recovery pass: rewrite stale references for converted items whose
    /// original file still coexists with the WebP (conversions run with
    /// `skip_references`, or interrupted before their rewrite).
    pub async fn rewrite_all_references(&self) -> Result<ReconcileReport> {
        let ids = self.catalog.list_converted(-1, 0).await?;
        let total = ids.len();
        let mut updated = 0usize;

        for id in ids {
            let Some(item) = self.catalog.get_item(id).await? else {
                continue;
            };
            let Some(stem) = item
                .path
                .strip_suffix(&format!(".{WEBP_EXTENSION}"))
            else {
                continue;
            };

            let mut set = RenameLocatorSet { pairs: Vec::new() };
            for ext in SourceFormat::all_extensions() {
                let old_rel = format!("{stem}.{ext}");
                if self.storage.exists(&old_rel).await {
                    set.pairs.extend(
                        RenameLocatorSet::for_rename(
                            &self.config.base_url,
                            &old_rel,
                            &item.path,
                        )
                        .pairs,
                    );
                }
            }

            if set.pairs.is_empty() {
                continue;
            }
            match self.rewriter.rewrite(&set).await {
                Ok(_) => updated += 1,
                Err(e) => {
                    warn!(item = %id, error = %e, "reference reconciliation failed");
                }
            }
        }

        info!(updated, total, "reference reconciliation finished");
        Ok(ReconcileReport { updated, total })
    }
}
