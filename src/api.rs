//! JSON handlers for the dashboard HTTP API

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dashboard::{Dashboard, DashboardReport};
use crate::form::{DataMode, FormEvent, FormState, InputMode, form_error};
use crate::open_meteo::Collaborators;
use crate::validation::validate_recent_days;
use crate::{VERSION, WeatherDashError};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub collaborators: Collaborators,
    pub dashboard: Dashboard,
}

impl AppState {
    #[must_use]
    pub fn new(collaborators: Collaborators, forecast_days: u32) -> Self {
        let dashboard = Dashboard::new(collaborators.weather.clone(), forecast_days);
        Self {
            collaborators,
            dashboard,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// Geocoding or weather service failed
    Upstream(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = ApiError {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<WeatherDashError> for AppError {
    fn from(err: WeatherDashError) -> Self {
        let message = err.user_message();
        match err {
            WeatherDashError::Validation { .. } => AppError::BadRequest(message),
            WeatherDashError::NotFound { .. } => AppError::NotFound(message),
            WeatherDashError::Api { .. } => AppError::Upstream(message),
            _ => AppError::Internal(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<WeatherDashError>() {
            Ok(known) => known.into(),
            Err(other) => {
                warn!("Upstream failure: {:#}", other);
                AppError::Upstream(
                    WeatherDashError::api(other.to_string()).user_message(),
                )
            }
        }
    }
}

pub type HandlerResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub q: String,
}

/// An accepted geocoding match
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    pub display_name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub confirmation: Option<String>,
}

/// Body of `POST /api/dashboard`
#[derive(Debug, Default, Deserialize)]
pub struct DashboardRequest {
    pub query: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub recent_days: Option<u32>,
}

impl DashboardRequest {
    /// Fields that cannot be combined in one request
    #[must_use]
    pub fn conflict(&self) -> Option<&'static str> {
        let historical = self.start_date.is_some() || self.end_date.is_some();
        if self.query.is_some() && (self.latitude.is_some() || self.longitude.is_some()) {
            Some("Choose either a location query or coordinates, not both.")
        } else if historical && self.recent_days.is_some() {
            Some("Choose either a date range or recent days, not both.")
        } else {
            None
        }
    }

    /// Translate the body into the same edits a user would make
    #[must_use]
    pub fn to_form(&self) -> FormState {
        let mut events = Vec::new();

        match (&self.query, self.latitude, self.longitude) {
            (Some(query), _, _) => events.push(FormEvent::QueryChanged(query.clone())),
            (None, None, None) => {}
            (None, latitude, longitude) => {
                events.push(FormEvent::InputModeSelected(InputMode::Coordinates));
                events.push(FormEvent::LatitudeChanged(
                    latitude.map(|v| v.to_string()).unwrap_or_default(),
                ));
                events.push(FormEvent::LongitudeChanged(
                    longitude.map(|v| v.to_string()).unwrap_or_default(),
                ));
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            events.push(FormEvent::DataModeSelected(DataMode::Historical));
            events.push(FormEvent::StartDateChanged(
                self.start_date.clone().unwrap_or_default(),
            ));
            events.push(FormEvent::EndDateChanged(
                self.end_date.clone().unwrap_or_default(),
            ));
        }

        FormState::new().apply_all(events)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/geocode", get(geocode))
        .route("/dashboard", post(dashboard))
        .with_state(state)
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}

/// GET /api/geocode?q=
///
/// Runs the same search a form would, including the result checks.
async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> HandlerResult<LocationResponse> {
    let form = FormState::new()
        .apply(FormEvent::QueryChanged(params.q))
        .search(state.collaborators.geocoder.as_ref())
        .await;

    if let Some(message) = &form.error {
        return Err(form_error(message).into());
    }
    let accepted = form
        .accepted
        .ok_or_else(|| AppError::Internal("Search finished without a location".to_string()))?;

    Ok(Json(LocationResponse {
        display_name: accepted.display_name,
        country: accepted.country,
        latitude: accepted.coordinate.latitude,
        longitude: accepted.coordinate.longitude,
        confirmation: form.confirmation,
    }))
}

/// POST /api/dashboard
async fn dashboard(
    State(state): State<AppState>,
    Json(request): Json<DashboardRequest>,
) -> HandlerResult<DashboardReport> {
    if let Some(message) = request.conflict() {
        return Err(AppError::BadRequest(message.to_string()));
    }
    let recent_days = match request.recent_days {
        Some(days) => Some(
            validate_recent_days(days)
                .map_err(|issue| AppError::BadRequest(issue.to_string()))?,
        ),
        None => None,
    };

    let today = Local::now().date_naive();
    let (form, submission) = request
        .to_form()
        .submit_resolved(state.collaborators.geocoder.as_ref(), today)
        .await;

    let Some(submission) = submission else {
        let message = form
            .error
            .unwrap_or_else(|| "Location could not be resolved".to_string());
        return Err(form_error(&message).into());
    };

    info!("Dashboard request for {}", submission.display_name);
    let report = match recent_days {
        Some(days) => state.dashboard.load_recent(&submission, days).await?,
        None => state.dashboard.load(&submission).await?,
    };
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_request_becomes_coordinate_form() {
        let request = DashboardRequest {
            latitude: Some(52.52),
            longitude: Some(13.41),
            ..Default::default()
        };
        let form = request.to_form();
        assert_eq!(form.input_mode, InputMode::Coordinates);
        assert_eq!(form.latitude_input, "52.52");
        assert_eq!(form.longitude_input, "13.41");
        assert_eq!(form.data_mode, DataMode::Forecast);
    }

    #[test]
    fn test_date_fields_select_historical_mode() {
        let request = DashboardRequest {
            query: Some("Berlin".to_string()),
            start_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        let form = request.to_form();
        assert_eq!(form.input_mode, InputMode::CitySearch);
        assert_eq!(form.data_mode, DataMode::Historical);
        assert_eq!(form.start_date, "2024-01-01");
        assert!(form.end_date.is_empty());
    }

    #[test]
    fn test_conflicting_fields() {
        let both_locations = DashboardRequest {
            query: Some("Berlin".to_string()),
            latitude: Some(52.52),
            ..Default::default()
        };
        assert_eq!(
            both_locations.conflict(),
            Some("Choose either a location query or coordinates, not both.")
        );

        let both_ranges = DashboardRequest {
            latitude: Some(52.52),
            longitude: Some(13.41),
            end_date: Some("2024-01-31".to_string()),
            recent_days: Some(3),
            ..Default::default()
        };
        assert_eq!(
            both_ranges.conflict(),
            Some("Choose either a date range or recent days, not both.")
        );

        let coordinates_only = DashboardRequest {
            latitude: Some(52.52),
            longitude: Some(13.41),
            recent_days: Some(3),
            ..Default::default()
        };
        assert_eq!(coordinates_only.conflict(), None);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (WeatherDashError::validation("bad"), StatusCode::BAD_REQUEST),
            (WeatherDashError::not_found("none"), StatusCode::NOT_FOUND),
            (WeatherDashError::api("down"), StatusCode::BAD_GATEWAY),
            (WeatherDashError::cache("disk"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            let response = AppError::from(error).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_untyped_failure_is_upstream() {
        let response = AppError::from(anyhow::anyhow!("connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
