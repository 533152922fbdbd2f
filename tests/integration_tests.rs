//! Integration tests for the weatherdash library, JSON API and CLI

use std::process::Command;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use tower::ServiceExt;

use weatherdash::form::{DataMode, NOT_FOUND_MESSAGE};
use weatherdash::render::{NO_DATA_MESSAGE, format_table};
use weatherdash::{
    Collaborators, Coordinate, Dashboard, DashboardConfig, FormEvent, FormState, Geocoder,
    LocationResult, SeriesRequest, WeatherProvider, WeatherSeries, web,
};

struct FixedGeocoder(Option<LocationResult>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Option<LocationResult>> {
        Ok(self.0.clone())
    }
}

/// Two hours on one day, one on the next
struct FixedWeather;

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn series(&self, _coordinate: Coordinate, _request: SeriesRequest) -> Result<WeatherSeries> {
        Ok(WeatherSeries {
            time: vec![
                "2024-03-01T00:00".to_string(),
                "2024-03-01T01:00".to_string(),
                "2024-03-02T00:00".to_string(),
            ],
            temperature_2m: vec![Some(4.0), Some(6.0), Some(8.0)],
            humidity: vec![Some(80.0), Some(70.0), Some(60.0)],
            wind_speed: vec![Some(2.0), Some(3.0), Some(4.0)],
            precipitation: vec![Some(0.5), Some(0.25), Some(0.0)],
            shortwave_radiation: vec![Some(0.0), Some(0.0), Some(50.0)],
        })
    }
}

struct BrokenWeather;

#[async_trait]
impl WeatherProvider for BrokenWeather {
    async fn series(&self, _coordinate: Coordinate, _request: SeriesRequest) -> Result<WeatherSeries> {
        Err(anyhow!("connection refused"))
    }
}

fn berlin() -> LocationResult {
    LocationResult {
        name: "Berlin".to_string(),
        country: "Germany".to_string(),
        latitude: 52.52,
        longitude: 13.41,
    }
}

fn collaborators(geocoder: Option<LocationResult>, weather: Arc<dyn WeatherProvider>) -> Collaborators {
    Collaborators {
        geocoder: Arc::new(FixedGeocoder(geocoder)),
        weather,
    }
}

fn app(collaborators: Collaborators) -> axum::Router {
    web::app(&DashboardConfig::default(), collaborators)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_city_search_to_table() {
    let collaborators = collaborators(Some(berlin()), Arc::new(FixedWeather));
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let (form, submission) = FormState::new()
        .apply(FormEvent::QueryChanged("Berlin".to_string()))
        .submit_resolved(collaborators.geocoder.as_ref(), today)
        .await;
    assert!(form.is_ready());
    let submission = submission.unwrap();

    let report = Dashboard::new(collaborators.weather.clone(), 7)
        .load(&submission)
        .await
        .unwrap();
    assert_eq!(report.daily.len(), 2);
    assert_eq!(report.daily[0].avg_temp, 5.0);
    assert_eq!(report.daily[0].total_precipitation, 0.8);
    assert_eq!(report.overall.as_ref().unwrap().days, 2);

    let table = format_table(&report);
    assert!(table.contains("Berlin, Germany"));
    assert!(table.contains("Mar 01"));
    assert!(table.contains("Mar 02"));
}

#[tokio::test]
async fn test_historical_submission_with_future_end_is_rejected() {
    let collaborators = collaborators(Some(berlin()), Arc::new(FixedWeather));
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let (form, submission) = FormState::new()
        .apply_all([
            FormEvent::QueryChanged("Berlin".to_string()),
            FormEvent::DataModeSelected(DataMode::Historical),
            FormEvent::StartDateChanged("2024-05-01".to_string()),
            FormEvent::EndDateChanged("2024-07-01".to_string()),
        ])
        .submit_resolved(collaborators.geocoder.as_ref(), today)
        .await;

    assert!(submission.is_none());
    assert_eq!(form.error.as_deref(), Some("End date cannot be in the future."));
    // the location itself was fine and stays accepted
    assert!(form.accepted.is_some());
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(collaborators(None, Arc::new(FixedWeather)))
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_geocode_endpoint_rejects_bad_query() {
    let response = app(collaborators(Some(berlin()), Arc::new(FixedWeather)))
        .oneshot(
            Request::get("/api/geocode?q=Berlin%21")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["message"], "Location contains invalid characters");
}

#[tokio::test]
async fn test_geocode_endpoint_not_found() {
    let response = app(collaborators(None, Arc::new(FixedWeather)))
        .oneshot(
            Request::get("/api/geocode?q=Atlantis")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_geocode_endpoint_success() {
    let response = app(collaborators(Some(berlin()), Arc::new(FixedWeather)))
        .oneshot(
            Request::get("/api/geocode?q=Berlin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["display_name"], "Berlin, Germany");
    assert_eq!(body["latitude"], 52.52);
}

#[tokio::test]
async fn test_dashboard_endpoint_with_coordinates() {
    let response = app(collaborators(None, Arc::new(FixedWeather)))
        .oneshot(post_json(
            "/api/dashboard",
            serde_json::json!({"latitude": 48.85, "longitude": 2.35}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["location_name"], "Coordinates (48.85°, 2.35°)");
    assert_eq!(body["daily"].as_array().unwrap().len(), 2);
    assert_eq!(body["mode"]["kind"], "forecast");
}

#[tokio::test]
async fn test_dashboard_endpoint_recent_days() {
    let response = app(collaborators(Some(berlin()), Arc::new(FixedWeather)))
        .oneshot(post_json(
            "/api/dashboard",
            serde_json::json!({"query": "Berlin", "recent_days": 5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mode"]["kind"], "recent");
    assert_eq!(body["mode"]["days"], 5);
}

#[tokio::test]
async fn test_dashboard_endpoint_rejects_out_of_range_latitude() {
    let response = app(collaborators(None, Arc::new(FixedWeather)))
        .oneshot(post_json(
            "/api/dashboard",
            serde_json::json!({"latitude": 91.0, "longitude": 0.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Latitude must be between -90 and 90");
}

#[tokio::test]
async fn test_dashboard_endpoint_requires_location() {
    let response = app(collaborators(None, Arc::new(FixedWeather)))
        .oneshot(post_json("/api/dashboard", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_endpoint_rejects_query_with_coordinates() {
    let response = app(collaborators(Some(berlin()), Arc::new(FixedWeather)))
        .oneshot(post_json(
            "/api/dashboard",
            serde_json::json!({"query": "Berlin", "latitude": 48.85, "longitude": 2.35}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Choose either a location query or coordinates, not both."
    );
}

#[tokio::test]
async fn test_dashboard_endpoint_weather_failure_is_bad_gateway() {
    let response = app(collaborators(Some(berlin()), Arc::new(BrokenWeather)))
        .oneshot(post_json(
            "/api/dashboard",
            serde_json::json!({"query": "Berlin"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[test]
fn test_empty_report_renders_no_data() {
    let report = weatherdash::DashboardReport {
        location_name: "Nowhere, Custom".to_string(),
        coordinate: Coordinate::new(0.0, 0.0),
        mode: weatherdash::ReportMode::Forecast { days: 7 },
        daily: Vec::new(),
        overall: None,
        generated_at: chrono::Utc::now(),
    };
    assert!(format_table(&report).contains(NO_DATA_MESSAGE));
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_weatherdash"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("weatherdash"));
    assert!(stdout.contains("forecast"));
    assert!(stdout.contains("history"));
}

/// Invalid queries fail before any request is made
#[test]
fn test_cli_rejects_invalid_query() {
    let cache = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_weatherdash"))
        .args(["search", "Berlin!"])
        .env("WEATHERDASH_CACHE__LOCATION", cache.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Location contains invalid characters"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_cli_rejects_reversed_dates() {
    let output = Command::new(env!("CARGO_BIN_EXE_weatherdash"))
        .args([
            "history",
            "--lat",
            "52.52",
            "--lon",
            "13.41",
            "--start",
            "2024-02-01",
            "--end",
            "2024-01-01",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Start date must be before end date."));
}

#[test]
fn test_cli_rejects_latitude_out_of_range() {
    let output = Command::new(env!("CARGO_BIN_EXE_weatherdash"))
        .args(["forecast", "--lat", "-95", "--lon", "10"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Latitude must be between -90 and 90"));
}
