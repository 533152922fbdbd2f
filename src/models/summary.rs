//! Per-day and overall summaries produced by the aggregator

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate of all samples sharing one calendar date
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailySummary {
    /// ISO calendar date (`YYYY-MM-DD`)
    pub date: String,
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
    pub total_precipitation: f64,
    pub avg_radiation: f64,
    /// Number of samples that contributed
    pub samples: usize,
}

impl DailySummary {
    /// Short label like `Jan 05`; falls back to the raw date text
    #[must_use]
    pub fn date_label(&self) -> String {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_or_else(|_| self.date.clone(), |d| d.format("%b %d").to_string())
    }
}

/// Statistics across all daily summaries
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OverallSummary {
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
    pub total_precipitation: f64,
    pub avg_radiation: f64,
    pub max_radiation: f64,
    /// Number of days summarized
    pub days: usize,
}
