//! Error types for the weather dashboard

use thiserror::Error;

use crate::validation::{ValidationIssue, ValidationIssues};

/// Typed failures that callers map to user messages, exit codes or HTTP status
#[derive(Error, Debug)]
pub enum WeatherDashError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Geocoding or weather service failed or answered with an error
    #[error("API error: {message}")]
    Api { message: String },

    /// Rejected query, coordinates or date range. The message is shown as is.
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The geocoder had no match
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl WeatherDashError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Whether the user can fix this by changing their input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherDashError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            WeatherDashError::Api { .. } => {
                "Unable to reach the weather service. Please try again.".to_string()
            }
            WeatherDashError::Validation { message } | WeatherDashError::NotFound { message } => {
                message.clone()
            }
            WeatherDashError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
        }
    }
}

impl From<ValidationIssue> for WeatherDashError {
    fn from(issue: ValidationIssue) -> Self {
        Self::validation(issue.to_string())
    }
}

impl From<ValidationIssues> for WeatherDashError {
    fn from(issues: ValidationIssues) -> Self {
        Self::validation(issues.to_string())
    }
}
