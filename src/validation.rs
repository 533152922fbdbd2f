//! Input validation for location queries, coordinates and date ranges
//!
//! Every check is pure and returns a `Result` whose error carries the
//! user-facing message. Nothing here panics or touches the network.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::DateRange;

/// Shortest accepted location query, in characters
pub const MIN_QUERY_LEN: usize = 2;
/// Longest accepted location query, in characters
pub const MAX_QUERY_LEN: usize = 100;
/// Longest look-back the forecast endpoint serves for recent data
pub const MAX_RECENT_DAYS: u32 = 92;

/// A single failed check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Please enter a city name")]
    EmptyQuery,

    #[error("Location name must be at least 2 characters")]
    QueryTooShort,

    #[error("Location name is too long (max 100 characters)")]
    QueryTooLong,

    #[error("Location contains invalid characters")]
    InvalidCharacters,

    #[error("Invalid coordinates received")]
    NonFiniteCoordinates,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    #[error("Location name appears to be just initials")]
    LooksLikeInitials,

    #[error("Please select both start and end dates for historical data.")]
    IncompleteDateRange,

    #[error("Invalid date '{0}', expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Start date must be before end date.")]
    StartNotBeforeEnd,

    #[error("End date cannot be in the future.")]
    EndInFuture,

    #[error("Recent days must be between 1 and 92")]
    RecentDaysOutOfRange,
}

/// All issues found by [`validate_location_data`], in check order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssues(pub Vec<ValidationIssue>);

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationIssues {}

fn is_allowed_query_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | ',' | '.' | '\'')
}

/// Check the syntax of a free-text location query
pub fn validate_location_input(query: &str) -> Result<(), ValidationIssue> {
    if query.trim().is_empty() {
        return Err(ValidationIssue::EmptyQuery);
    }

    // UTF-16 code units, so astral characters count twice
    let len = query.encode_utf16().count();
    if len < MIN_QUERY_LEN {
        return Err(ValidationIssue::QueryTooShort);
    }
    if len > MAX_QUERY_LEN {
        return Err(ValidationIssue::QueryTooLong);
    }

    if !query.chars().all(is_allowed_query_char) {
        return Err(ValidationIssue::InvalidCharacters);
    }

    Ok(())
}

/// Check that a coordinate pair is finite and within range
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationIssue> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(ValidationIssue::NonFiniteCoordinates);
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationIssue::LatitudeOutOfRange);
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationIssue::LongitudeOutOfRange);
    }

    Ok(())
}

/// True when every whitespace/comma separated token is one character long,
/// e.g. `"N Y"` or `"A, B"`.
#[must_use]
pub fn looks_like_initials(name: &str) -> bool {
    let trimmed = name.trim();
    // a separator at either end yields an empty token, which is not an initial
    if trimmed.is_empty() || trimmed.starts_with(',') || trimmed.ends_with(',') {
        return false;
    }

    trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .all(|part| part.encode_utf16().count() == 1)
}

/// Run the query, coordinate and initials checks and collect every issue
pub fn validate_location_data(
    name: &str,
    latitude: f64,
    longitude: f64,
) -> Result<(), ValidationIssues> {
    let mut issues = Vec::new();

    if let Err(issue) = validate_location_input(name) {
        issues.push(issue);
    }

    if let Err(issue) = validate_coordinates(latitude, longitude) {
        issues.push(issue);
    }

    if looks_like_initials(name) {
        issues.push(ValidationIssue::LooksLikeInitials);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationIssues(issues))
    }
}

/// Check a historical range: both ends set, `start < end`, `end <= today`
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange, ValidationIssue> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ValidationIssue::IncompleteDateRange);
    };

    if start >= end {
        return Err(ValidationIssue::StartNotBeforeEnd);
    }

    if end > today {
        return Err(ValidationIssue::EndInFuture);
    }

    Ok(DateRange { start, end })
}

/// Parse a `YYYY-MM-DD` form field. Blank input is an unset date.
pub fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, ValidationIssue> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationIssue::InvalidDate(input.to_string()))
}

/// [`validate_date_range`] over raw form text
pub fn validate_date_inputs(
    start: &str,
    end: &str,
    today: NaiveDate,
) -> Result<DateRange, ValidationIssue> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(ValidationIssue::IncompleteDateRange);
    }
    validate_date_range(parse_date_input(start)?, parse_date_input(end)?, today)
}

/// Check the look-back window for recent data
pub fn validate_recent_days(days: u32) -> Result<u32, ValidationIssue> {
    if (1..=MAX_RECENT_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ValidationIssue::RecentDaysOutOfRange)
    }
}
