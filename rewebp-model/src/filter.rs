//! Optional year/month restriction on the convertible-item set.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Restricts catalog queries to items created in one calendar month.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct DateFilter {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
}

impl DateFilter {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Half-open `[start, end)` UTC bounds of the configured month.
    ///
    /// Returns `None` for out-of-range year/month combinations so a bad
    /// filter selects nothing instead of everything.
    pub fn month_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let end = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        let start = Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?);
        let end = Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?);
        Some((start, end))
    }

    /// Whether `created_at` falls inside the configured month.
    pub fn contains(&self, created_at: DateTime<Utc>) -> bool {
        self.month_bounds()
            .map(|(start, end)| created_at >= start && created_at < end)
            .unwrap_or(false)
    }
}
