//! Open-Meteo client: geocoding, forecast and historical archive
//!
//! The [`Geocoder`] and [`WeatherProvider`] traits are the seam between the
//! form/dashboard logic and the network; [`OpenMeteoClient`] implements both.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::WeatherDashError;
use crate::cache::PersistentCache;
use crate::config::{ApiConfig, DashboardConfig};
use crate::models::{Coordinate, DateRange, LocationResult, WeatherSeries};

/// Hourly variables requested from every weather endpoint
const HOURLY_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation,shortwave_radiation";

/// Resolves free text to a place
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `query`, or `None` when nothing matched
    async fn geocode(&self, query: &str) -> Result<Option<LocationResult>>;
}

/// What series to fetch for a coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRequest {
    /// Hourly forecast for the next `days` days
    Forecast { days: u32 },
    /// Hourly data for the last `days` days, up to now
    Recent { days: u32 },
    /// Reanalysis archive for a closed date range
    Historical(DateRange),
}

/// Produces hourly weather series
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn series(&self, coordinate: Coordinate, request: SeriesRequest) -> Result<WeatherSeries>;
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingHit>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingHit {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

impl From<GeocodingHit> for LocationResult {
    fn from(hit: GeocodingHit) -> Self {
        Self {
            name: hit.name,
            country: hit.country.unwrap_or_else(|| "Unknown".to_string()),
            latitude: hit.latitude,
            longitude: hit.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyData>,
}

#[derive(Debug, Deserialize)]
struct HourlyData {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation: Vec<Option<f64>>,
}

impl From<HourlyData> for WeatherSeries {
    fn from(hourly: HourlyData) -> Self {
        Self {
            time: hourly.time,
            temperature_2m: hourly.temperature_2m,
            humidity: hourly.relative_humidity_2m,
            wind_speed: hourly.wind_speed_10m,
            precipitation: hourly.precipitation,
            shortwave_radiation: hourly.shortwave_radiation,
        }
    }
}

/// Error body Open-Meteo sends with 400 responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: Option<String>,
}

/// HTTP client for the Open-Meteo APIs
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    api: ApiConfig,
    cache: Option<PersistentCache>,
    forecast_ttl: Duration,
    historical_ttl: Duration,
    geocoding_ttl: Duration,
}

impl OpenMeteoClient {
    /// Create a client without a response cache
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.api.timeout_seconds.into());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weatherdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.api.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let hours = |h: u32| Duration::from_secs(u64::from(h) * 3600);
        Ok(Self {
            client,
            api: config.api.clone(),
            cache: None,
            forecast_ttl: hours(config.cache.forecast_ttl_hours),
            historical_ttl: hours(config.cache.historical_ttl_hours),
            geocoding_ttl: hours(config.cache.geocoding_ttl_hours),
        })
    }

    /// Create a client, attaching the on-disk cache when enabled
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let client = Self::new(config)?;
        if !config.cache.enabled {
            return Ok(client);
        }

        match PersistentCache::open(&config.cache.location) {
            Ok(cache) => Ok(client.with_cache(cache)),
            Err(e) => {
                warn!("Response cache disabled: {:#}", e);
                Ok(client)
            }
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: PersistentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Geocoding search URL
    #[must_use]
    pub fn geocoding_url(&self, query: &str) -> String {
        format!(
            "{}/search?name={}&count={}&language={}&format=json",
            self.api.geocoding_url.trim_end_matches('/'),
            urlencoding::encode(query),
            self.api.geocoding_results,
            urlencoding::encode(&self.api.language)
        )
    }

    /// Weather URL for a series request
    #[must_use]
    pub fn series_url(&self, coordinate: Coordinate, request: SeriesRequest) -> String {
        let location = format!(
            "latitude={}&longitude={}&hourly={}&wind_speed_unit=ms&timezone=auto",
            coordinate.latitude, coordinate.longitude, HOURLY_VARIABLES
        );

        match request {
            SeriesRequest::Forecast { days } => format!(
                "{}/forecast?{location}&forecast_days={days}",
                self.api.forecast_url.trim_end_matches('/')
            ),
            SeriesRequest::Recent { days } => format!(
                "{}/forecast?{location}&past_days={days}&forecast_days=0",
                self.api.forecast_url.trim_end_matches('/')
            ),
            SeriesRequest::Historical(range) => format!(
                "{}/archive?{location}&start_date={}&end_date={}",
                self.api.archive_url.trim_end_matches('/'),
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d")
            ),
        }
    }

    fn series_cache_entry(&self, coordinate: Coordinate, request: SeriesRequest) -> (String, Duration) {
        match request {
            SeriesRequest::Forecast { days } => (
                format!("forecast:{}:{days}", coordinate.to_key()),
                self.forecast_ttl,
            ),
            SeriesRequest::Recent { days } => (
                format!("recent:{}:{days}", coordinate.to_key()),
                self.forecast_ttl,
            ),
            SeriesRequest::Historical(range) => (
                format!("archive:{}:{}", coordinate.to_key(), range.to_key()),
                self.historical_ttl,
            ),
        }
    }

    async fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let cache = self.cache.as_ref()?;
        match cache.get::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read failed for '{}': {:#}", key, e);
                None
            }
        }
    }

    async fn store<T>(&self, key: &str, value: T, ttl: Duration)
    where
        T: serde::Serialize + Send + std::fmt::Debug + 'static,
    {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(key, value, ttl).await {
                warn!("Cache write failed for '{}': {:#}", key, e);
            }
        }
    }

    /// GET `url` and decode JSON, mapping non-success statuses to API errors
    #[instrument(skip(self), level = "debug")]
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start_time = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherDashError::api(format!("Request failed: {e}")))?;

        let status = response.status();
        debug!("HTTP response received: {} in {:.3}s", status, start_time.elapsed().as_secs_f64());

        if !status.is_success() {
            let reason = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.reason)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(WeatherDashError::api(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                reason
            ))
            .into());
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| WeatherDashError::api(format!("Invalid response from Open-Meteo: {e}")))?;

        let elapsed = start_time.elapsed();
        if elapsed.as_secs() > 5 {
            warn!("Slow API response: {:.3}s", elapsed.as_secs_f64());
        }
        Ok(body)
    }
}

#[async_trait]
impl Geocoder for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<LocationResult>> {
        let key = format!("geocode:{}:{}", self.api.language, query.trim().to_lowercase());
        if let Some(hit) = self.cached::<Option<LocationResult>>(&key).await {
            debug!("Geocoding cache hit for '{}'", query);
            return Ok(hit);
        }

        info!("Geocoding location: '{}'", query);
        let response: GeocodingResponse = self.get_json(&self.geocoding_url(query)).await?;
        let best = response
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(LocationResult::from);

        match &best {
            Some(hit) => info!(
                "Resolved '{}' to {} ({:.4}, {:.4})",
                query,
                hit.display_name(),
                hit.latitude,
                hit.longitude
            ),
            None => warn!("No results found for location '{}'", query),
        }

        self.store(&key, best.clone(), self.geocoding_ttl).await;
        Ok(best)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn series(&self, coordinate: Coordinate, request: SeriesRequest) -> Result<WeatherSeries> {
        let (key, ttl) = self.series_cache_entry(coordinate, request);
        if let Some(series) = self.cached::<WeatherSeries>(&key).await {
            debug!("Series cache hit: {}", key);
            return Ok(series);
        }

        info!("Fetching {:?} for {}", request, coordinate.format_degrees());
        let response: ForecastResponse = self.get_json(&self.series_url(coordinate, request)).await?;
        let series: WeatherSeries = response.hourly.map(WeatherSeries::from).unwrap_or_default();
        info!("Received {} hourly samples", series.len());

        self.store(&key, series.clone(), ttl).await;
        Ok(series)
    }
}

/// Shared handles for the two collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl Collaborators {
    #[must_use]
    pub fn open_meteo(client: OpenMeteoClient) -> Self {
        let client = Arc::new(client);
        Self {
            geocoder: client.clone(),
            weather: client,
        }
    }
}
