//! `weatherdash` - weather dashboard over the Open-Meteo APIs
//!
//! Validates a city query or a coordinate pair, resolves it through the
//! geocoding service, fetches an hourly forecast or a historical range and
//! summarizes it per day and overall. The same flow backs the CLI and the
//! JSON API.

pub mod aggregation;
pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod logging;
pub mod models;
pub mod open_meteo;
pub mod render;
pub mod validation;
pub mod web;

// Re-export core types for public API
pub use aggregation::{aggregate_by_day, summarize};
pub use cache::PersistentCache;
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardReport, ReportMode};
pub use error::WeatherDashError;
pub use form::{FormEvent, FormState, Submission};
pub use models::{
    Coordinate, DailySummary, DateRange, LocationResult, OverallSummary, WeatherSample,
    WeatherSeries,
};
pub use open_meteo::{Collaborators, Geocoder, OpenMeteoClient, SeriesRequest, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherDashError>;
