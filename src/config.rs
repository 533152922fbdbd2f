//! Configuration management for the weather dashboard
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherDashError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Open-Meteo endpoints and HTTP behaviour
    #[serde(default)]
    pub api: ApiConfig,
    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default request settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Open-Meteo API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Base URL of the forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Base URL of the historical archive API
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Number of geocoding candidates to request
    #[serde(default = "default_geocoding_results")]
    pub geocoding_results: u32,
    /// Language for geocoding names
    #[serde(default = "default_language")]
    pub language: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached on disk
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// TTL of forecast responses in hours
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_hours: u32,
    /// TTL of archive responses in hours
    #[serde(default = "default_historical_ttl")]
    pub historical_ttl_hours: u32,
    /// TTL of geocoding responses in hours
    #[serde(default = "default_geocoding_ttl")]
    pub geocoding_ttl_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Days of forecast to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    /// Days of recent past for the recent view
    #[serde(default = "default_past_days")]
    pub past_days: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound on a single API request, upstream retries included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_geocoding_results() -> u32 {
    5
}

fn default_language() -> String {
    "en".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("weatherdash"))
        .unwrap_or_else(|| PathBuf::from(".cache/weatherdash"))
        .to_string_lossy()
        .into_owned()
}

fn default_forecast_ttl() -> u32 {
    1
}

fn default_historical_ttl() -> u32 {
    24 * 30
}

fn default_geocoding_ttl() -> u32 {
    24 * 7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_forecast_days() -> u32 {
    7
}

fn default_past_days() -> u32 {
    10
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            geocoding_results: default_geocoding_results(),
            language: default_language(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            location: default_cache_location(),
            forecast_ttl_hours: default_forecast_ttl(),
            historical_ttl_hours: default_historical_ttl(),
            geocoding_ttl_hours: default_geocoding_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            past_days: default_past_days(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            defaults: DefaultsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(WeatherDashError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERDASH_API__TIMEOUT_SECONDS=10
        builder = builder.add_source(
            Environment::with_prefix("WEATHERDASH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DashboardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherdash").join("config.toml"))
    }

    /// Apply default values to empty or zeroed configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.geocoding_url.is_empty() {
            self.api.geocoding_url = default_geocoding_url();
        }
        if self.api.forecast_url.is_empty() {
            self.api.forecast_url = default_forecast_url();
        }
        if self.api.archive_url.is_empty() {
            self.api.archive_url = default_archive_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_timeout();
        }
        if self.api.geocoding_results == 0 {
            self.api.geocoding_results = default_geocoding_results();
        }
        if self.api.language.is_empty() {
            self.api.language = default_language();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.forecast_days == 0 {
            self.defaults.forecast_days = default_forecast_days();
        }
        if self.defaults.past_days == 0 {
            self.defaults.past_days = default_past_days();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(WeatherDashError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.api.max_retries > 10 {
            return Err(WeatherDashError::config("API max retries cannot exceed 10").into());
        }

        if self.api.geocoding_results > 100 {
            return Err(
                WeatherDashError::config("Geocoding results cannot exceed 100").into(),
            );
        }

        if self.cache.forecast_ttl_hours > 168 {
            return Err(WeatherDashError::config(
                "Forecast cache TTL cannot exceed 168 hours (1 week)",
            )
            .into());
        }

        if self.cache.historical_ttl_hours > 8760 || self.cache.geocoding_ttl_hours > 8760 {
            return Err(
                WeatherDashError::config("Cache TTL cannot exceed 8760 hours (1 year)").into(),
            );
        }

        if self.defaults.forecast_days > 16 {
            return Err(WeatherDashError::config("Forecast days cannot exceed 16").into());
        }

        if self.defaults.past_days > 92 {
            return Err(WeatherDashError::config("Past days cannot exceed 92").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherDashError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherDashError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocoding", &self.api.geocoding_url),
            ("forecast", &self.api.forecast_url),
            ("archive", &self.api.archive_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherDashError::config(format!(
                    "The {name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.api.forecast_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.api.archive_url, "https://archive-api.open-meteo.com/v1");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.cache.forecast_ttl_hours, 1);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.forecast_days, 7);
        assert_eq!(config.defaults.past_days, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = DashboardConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = DashboardConfig::default();
        config.api.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = DashboardConfig::default();
        config.defaults.forecast_days = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = DashboardConfig::default();
        config.api.archive_url = "ftp://example.org".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("archive base URL"));
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = DashboardConfig::default();
        config.api.timeout_seconds = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\ntimeout_seconds = 12\n\n[defaults]\nforecast_days = 3\n\n[cache]\nenabled = false"
        )
        .unwrap();

        let config = DashboardConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.timeout_seconds, 12);
        assert_eq!(config.defaults.forecast_days, 3);
        assert!(!config.cache.enabled);
        // untouched sections keep their defaults
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = DashboardConfig::load_from_path(Some(PathBuf::from("/nonexistent/weatherdash.toml")));
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = DashboardConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("weatherdash"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
