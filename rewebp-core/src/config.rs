//! Engine configuration.
//!
//! Loaded from an optional `rewebp.toml` plus `REWEBP_`-prefixed
//! environment overrides; every field has a default so embedding callers
//! can also construct the struct directly.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rewebp_model::DateFilter;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default per-call wall-clock budget. Sits well under the 300 s ceiling
/// a typical admin-facing request cycle imposes on the caller.
pub const DEFAULT_TIME_BUDGET_SECS: u64 = 240;

/// Default page size for the batch loop.
pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// WebP encode quality, 0.0–100.0.
    pub quality: f32,
    /// Page size used when the batch request does not specify one.
    pub batch_size: usize,
    /// Per-call wall-clock budget in seconds.
    pub time_budget_secs: u64,
    /// Public URL root of the storage tree; used to build rename
    /// locator sets.
    pub base_url: Url,
    /// Filesystem root of the storage tree.
    pub upload_root: PathBuf,
    /// Optional year/month restriction on the convertible set.
    pub date_filter: Option<DateFilter>,
    /// Install-time gate read only by the upload interceptor: uploads
    /// created before this instant are left to the batch path.
    pub installed_at: Option<DateTime<Utc>>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            quality: 100.0,
            batch_size: DEFAULT_BATCH_SIZE,
            time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
            base_url: Url::parse("http://localhost/uploads")
                .expect("default base url is valid"),
            upload_root: PathBuf::from("uploads"),
            date_filter: None,
            installed_at: None,
        }
    }
}

impl ConverterConfig {
    /// Load from `rewebp.toml` (if present) and the environment.
    ///
    /// Environment variables use the `REWEBP_` prefix with `__` as the
    /// nesting separator, e.g. `REWEBP_DATE_FILTER__YEAR=2024`.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("rewebp").required(false))
            .add_source(
                config::Environment::with_prefix("REWEBP").separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}
