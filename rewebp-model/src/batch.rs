//! Request/report shapes for the resumable batch loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameters for one `run_batch` call.
///
/// The caller owns the cursor: it passes back the `next_offset` of the
/// previous report and keeps calling until `completed` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub batch_size: usize,
    /// Progress counter from the previous call's `next_offset`
    /// (0 for a fresh job).
    pub offset: usize,
    /// Skip the per-item reference rewrite; `rewrite_all_references`
    /// reconciles later.
    pub skip_references: bool,
    /// Itemize successful conversions in `results` as well as failures.
    #[serde(default)]
    pub verbose: bool,
    /// Wall-clock budget override; the configured default applies when
    /// unset.
    #[serde(default)]
    pub time_budget: Option<Duration>,
}

impl BatchRequest {
    pub fn new(batch_size: usize, offset: usize) -> Self {
        Self {
            batch_size,
            offset,
            skip_references: true,
            verbose: false,
            time_budget: None,
        }
    }
}

/// Per-item conversion outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub id: Uuid,
    pub success: bool,
    /// Relative locator before conversion, when known.
    pub old_locator: Option<String>,
    /// Relative locator after conversion, when known.
    pub new_locator: Option<String>,
    pub message: String,
}

impl ConversionResult {
    pub fn failure(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            old_locator: None,
            new_locator: None,
            message: message.into(),
        }
    }
}

/// Aggregate outcome of one `run_batch` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Items handled this call; equals `converted + errors` unless the
    /// page was truncated by the wall-clock budget.
    pub processed: usize,
    pub converted: usize,
    pub errors: usize,
    /// Failed items, plus successes in verbose mode.
    pub results: Vec<ConversionResult>,
    /// Always `offset + processed`.
    pub next_offset: usize,
    pub has_more: bool,
    pub completed: bool,
    pub timed_out: bool,
    pub message: String,
}

/// Outcome of the reference-reconciliation recovery pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Converted items whose stale references were rewritten.
    pub updated: usize,
    /// Converted items inspected.
    pub total: usize,
}
