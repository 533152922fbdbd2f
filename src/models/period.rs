//! Historical date range

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// First day covered by the ERA5 reanalysis archive. The archive rejects
/// earlier dates; the validator does not enforce it.
pub const HISTORICAL_EPOCH: (i32, u32, u32) = (1940, 1, 1);

/// Inclusive calendar range for historical data, `start < end`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered, both ends included
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether the range reaches back before the archive's first day
    #[must_use]
    pub fn predates_archive(&self) -> bool {
        let (y, m, d) = HISTORICAL_EPOCH;
        NaiveDate::from_ymd_opt(y, m, d).is_some_and(|epoch| self.start < epoch)
    }

    #[must_use]
    pub fn to_key(&self) -> String {
        format!("{}:{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}
