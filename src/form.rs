//! Location form state and its transitions
//!
//! [`FormState`] is an immutable value. Field edits go through
//! [`FormState::apply`]; the two actions that may call the geocoder are
//! [`FormState::search`] and [`FormState::submit`]. Every transition keeps one
//! invariant: an accepted location never coexists with an edited, not yet
//! validated query or coordinate text, and never with an error about it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::WeatherDashError;
use crate::models::{Coordinate, DateRange, LocationResult};
use crate::open_meteo::Geocoder;
use crate::validation::{
    validate_coordinates, validate_date_inputs, validate_location_data, validate_location_input,
};

pub const NOT_FOUND_MESSAGE: &str =
    "Location not found. Please check the spelling or try another city.";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search location. Please try again.";
pub const NO_LOCATION_MESSAGE: &str = "Please search for a location or enter coordinates.";

/// Classify a form error message for callers outside the form
#[must_use]
pub fn form_error(message: &str) -> WeatherDashError {
    match message {
        NOT_FOUND_MESSAGE => WeatherDashError::not_found(message),
        SEARCH_FAILED_MESSAGE => WeatherDashError::api(message),
        _ => WeatherDashError::validation(message),
    }
}

/// How the user supplies a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    CitySearch,
    Coordinates,
}

/// Which data the dashboard loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataMode {
    #[default]
    Forecast,
    Historical,
}

/// Where an accepted location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    Geocoded,
    Manual,
}

/// A location that passed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedLocation {
    pub coordinate: Coordinate,
    /// `"Berlin, Germany"` or `"Coordinates (52.52°, 13.41°)"`
    pub display_name: String,
    /// Country name, `"Custom"` for manual coordinates
    pub country: String,
    pub source: LocationSource,
}

/// A finalized request for weather data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub coordinate: Coordinate,
    pub display_name: String,
    pub historical: Option<DateRange>,
}

/// What the geocoder said about a query
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(LocationResult),
    NotFound,
    /// The geocoding request itself failed
    Failed,
}

/// Field edits and toggles
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    QueryChanged(String),
    LatitudeChanged(String),
    LongitudeChanged(String),
    InputModeSelected(InputMode),
    DataModeSelected(DataMode),
    StartDateChanged(String),
    EndDateChanged(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub input_mode: InputMode,
    pub data_mode: DataMode,
    pub query: String,
    pub latitude_input: String,
    pub longitude_input: String,
    pub start_date: String,
    pub end_date: String,
    pub accepted: Option<AcceptedLocation>,
    /// Confirmation shown after a successful search
    pub confirmation: Option<String>,
    pub error: Option<String>,
}

/// Form-level number parsing: anything unparsable becomes NaN so that the
/// coordinate check reports it as non-finite.
fn parse_number(input: &str) -> f64 {
    input.trim().parse::<f64>().unwrap_or(f64::NAN)
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a field edit or toggle
    #[must_use]
    pub fn apply(self, event: FormEvent) -> Self {
        match event {
            FormEvent::QueryChanged(query) => Self {
                query,
                ..self.invalidated()
            },
            FormEvent::LatitudeChanged(latitude_input) => Self {
                latitude_input,
                ..self.invalidated()
            },
            FormEvent::LongitudeChanged(longitude_input) => Self {
                longitude_input,
                ..self.invalidated()
            },
            FormEvent::InputModeSelected(input_mode) => Self {
                input_mode,
                ..self.invalidated()
            },
            FormEvent::DataModeSelected(data_mode) => Self {
                data_mode,
                error: None,
                ..self
            },
            FormEvent::StartDateChanged(start_date) => Self {
                start_date,
                error: None,
                ..self
            },
            FormEvent::EndDateChanged(end_date) => Self {
                end_date,
                error: None,
                ..self
            },
        }
    }

    /// Apply several events in order
    #[must_use]
    pub fn apply_all(self, events: impl IntoIterator<Item = FormEvent>) -> Self {
        events.into_iter().fold(self, Self::apply)
    }

    /// Whether the form holds an accepted location and no error
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.accepted.is_some() && self.error.is_none()
    }

    /// Drop the accepted location and all messages about it
    fn invalidated(self) -> Self {
        Self {
            accepted: None,
            confirmation: None,
            error: None,
            ..self
        }
    }

    /// Record a failure; any accepted location is dropped with it
    fn rejected(self, message: impl Into<String>) -> Self {
        let message = message.into();
        debug!("Form rejected: {}", message);
        Self {
            error: Some(message),
            ..self.invalidated()
        }
    }

    /// Record a failure that does not concern the location itself
    fn with_error(self, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..self
        }
    }

    /// Validate the query, geocode it and fold the outcome into the state
    pub async fn search(self, geocoder: &dyn Geocoder) -> Self {
        if let Err(issue) = validate_location_input(&self.query) {
            return self.rejected(issue.to_string());
        }

        let outcome = match geocoder.geocode(&self.query).await {
            Ok(Some(result)) => SearchOutcome::Found(result),
            Ok(None) => SearchOutcome::NotFound,
            Err(e) => {
                warn!("Geocoding '{}' failed: {:#}", self.query, e);
                SearchOutcome::Failed
            }
        };
        self.resolve_search(outcome)
    }

    /// Pure part of [`FormState::search`]: fold a geocoding outcome into the state
    #[must_use]
    pub fn resolve_search(self, outcome: SearchOutcome) -> Self {
        let result = match outcome {
            SearchOutcome::Found(result) => result,
            SearchOutcome::NotFound => return self.rejected(NOT_FOUND_MESSAGE),
            SearchOutcome::Failed => return self.rejected(SEARCH_FAILED_MESSAGE),
        };

        if let Err(issue) = validate_coordinates(result.latitude, result.longitude) {
            return self.rejected(issue.to_string());
        }

        if let Err(issues) = validate_location_data(&result.name, result.latitude, result.longitude)
        {
            return self.rejected(issues.to_string());
        }

        let confirmation = format!(
            "✓ Location validated: {} ({})",
            result.display_name(),
            result.coordinate().format_degrees()
        );
        info!("{}", confirmation);

        Self {
            accepted: Some(AcceptedLocation {
                coordinate: result.coordinate(),
                display_name: result.display_name(),
                country: result.country.clone(),
                source: LocationSource::Geocoded,
            }),
            confirmation: Some(confirmation),
            error: None,
            ..self
        }
    }

    /// Accept the typed coordinates, or report why they are invalid
    #[must_use]
    pub fn accept_coordinates(self) -> Self {
        let latitude = parse_number(&self.latitude_input);
        let longitude = parse_number(&self.longitude_input);

        if let Err(issue) = validate_coordinates(latitude, longitude) {
            return self.rejected(issue.to_string());
        }

        let coordinate = Coordinate::new(latitude, longitude);
        Self {
            accepted: Some(AcceptedLocation {
                coordinate,
                display_name: format!("Coordinates ({})", coordinate.format_degrees()),
                country: "Custom".to_string(),
                source: LocationSource::Manual,
            }),
            error: None,
            ..self
        }
    }

    /// Run the submission flow.
    ///
    /// In city mode without an accepted location this performs the search
    /// and returns no submission; the caller submits again once the
    /// location is confirmed.
    pub async fn submit(
        self,
        geocoder: &dyn Geocoder,
        today: NaiveDate,
    ) -> (Self, Option<Submission>) {
        let state = if self.accepted.is_some() {
            self
        } else {
            let mode = self.input_mode;
            match mode {
                InputMode::CitySearch if !self.query.is_empty() => {
                    if let Err(issue) = validate_location_input(&self.query) {
                        return (self.with_error(issue.to_string()), None);
                    }
                    return (self.search(geocoder).await, None);
                }
                InputMode::Coordinates => {
                    let state = self.accept_coordinates();
                    if state.accepted.is_none() {
                        return (state, None);
                    }
                    state
                }
                InputMode::CitySearch => return (self.with_error(NO_LOCATION_MESSAGE), None),
            }
        };

        state.finalize(today)
    }

    /// [`FormState::submit`] that also finishes a successful search.
    ///
    /// Non-interactive callers use this: a city query is searched and, if
    /// accepted, submitted in the same call.
    pub async fn submit_resolved(
        self,
        geocoder: &dyn Geocoder,
        today: NaiveDate,
    ) -> (Self, Option<Submission>) {
        let (state, submission) = self.submit(geocoder, today).await;
        if submission.is_some() || state.error.is_some() {
            return (state, submission);
        }
        debug!("Search accepted, submitting again");
        state.submit(geocoder, today).await
    }

    /// Date-range and final location checks on a state with an accepted location
    #[must_use]
    pub fn finalize(self, today: NaiveDate) -> (Self, Option<Submission>) {
        let Some(accepted) = self.accepted.clone() else {
            return (self.with_error(NO_LOCATION_MESSAGE), None);
        };

        let historical = match self.data_mode {
            DataMode::Forecast => None,
            DataMode::Historical => {
                match validate_date_inputs(&self.start_date, &self.end_date, today) {
                    Ok(range) => Some(range),
                    Err(issue) => return (self.with_error(issue.to_string()), None),
                }
            }
        };

        if accepted.source == LocationSource::Geocoded {
            let Coordinate {
                latitude,
                longitude,
            } = accepted.coordinate;
            if let Err(issues) = validate_location_data(&accepted.display_name, latitude, longitude)
            {
                return (self.rejected(issues.to_string()), None);
            }
        }

        let submission = Submission {
            coordinate: accepted.coordinate,
            display_name: accepted.display_name,
            historical,
        };
        info!("Submitting {:?}", submission);
        (
            Self {
                error: None,
                ..self
            },
            Some(submission),
        )
    }
}
