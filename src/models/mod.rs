//! Data models for the weather dashboard
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and geocoding results
//! - Weather: timestamped samples and the raw parallel-array series
//! - Period: historical date ranges
//! - Summary: per-day and overall aggregates

pub mod location;
pub mod period;
pub mod summary;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, LocationResult};
pub use period::{DateRange, HISTORICAL_EPOCH};
pub use summary::{DailySummary, OverallSummary};
pub use weather::{WeatherSample, WeatherSeries};
