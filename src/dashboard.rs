//! Dashboard service: fetch a series for a submission and summarize it

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregation::{aggregate_by_day, summarize};
use crate::form::Submission;
use crate::models::{Coordinate, DailySummary, DateRange, OverallSummary};
use crate::open_meteo::{SeriesRequest, WeatherProvider};

/// Which kind of data a report holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReportMode {
    Forecast { days: u32 },
    Recent { days: u32 },
    Historical { start: chrono::NaiveDate, end: chrono::NaiveDate },
}

impl From<SeriesRequest> for ReportMode {
    fn from(request: SeriesRequest) -> Self {
        match request {
            SeriesRequest::Forecast { days } => Self::Forecast { days },
            SeriesRequest::Recent { days } => Self::Recent { days },
            SeriesRequest::Historical(DateRange { start, end }) => Self::Historical { start, end },
        }
    }
}

/// Everything the table and JSON views need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub location_name: String,
    pub coordinate: Coordinate,
    pub mode: ReportMode,
    /// One row per calendar day, oldest first. Empty means "no data".
    pub daily: Vec<DailySummary>,
    pub overall: Option<OverallSummary>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardReport {
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.daily.is_empty()
    }
}

/// Loads and summarizes weather series
#[derive(Clone)]
pub struct Dashboard {
    weather: Arc<dyn WeatherProvider>,
    forecast_days: u32,
}

impl Dashboard {
    #[must_use]
    pub fn new(weather: Arc<dyn WeatherProvider>, forecast_days: u32) -> Self {
        Self {
            weather,
            forecast_days,
        }
    }

    /// Series request implied by a submission
    #[must_use]
    pub fn request_for(&self, submission: &Submission) -> SeriesRequest {
        match submission.historical {
            Some(range) => SeriesRequest::Historical(range),
            None => SeriesRequest::Forecast {
                days: self.forecast_days,
            },
        }
    }

    /// Forecast or historical report for a validated submission
    pub async fn load(&self, submission: &Submission) -> Result<DashboardReport> {
        if let Some(range) = submission.historical {
            if range.predates_archive() {
                warn!(
                    "Range starts {} which predates the archive; expect missing days",
                    range.start
                );
            }
        }
        let request = self.request_for(submission);
        self.build(submission, request).await
    }

    /// Report for the last `days` days up to now
    pub async fn load_recent(&self, submission: &Submission, days: u32) -> Result<DashboardReport> {
        self.build(submission, SeriesRequest::Recent { days }).await
    }

    async fn build(&self, submission: &Submission, request: SeriesRequest) -> Result<DashboardReport> {
        info!(
            "Loading {:?} for {} ({})",
            request,
            submission.display_name,
            submission.coordinate.format_degrees()
        );

        let series = self.weather.series(submission.coordinate, request).await?;
        let samples = series.samples();
        debug!("{} usable samples of {}", samples.len(), series.len());

        let daily = aggregate_by_day(&samples);
        let overall = summarize(&daily);
        if daily.is_empty() {
            warn!("No data returned for {}", submission.display_name);
        } else {
            info!("Summarized {} samples into {} days", samples.len(), daily.len());
        }

        Ok(DashboardReport {
            location_name: submission.display_name.clone(),
            coordinate: submission.coordinate,
            mode: request.into(),
            daily,
            overall,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherSeries;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records requests and replays a fixed series
    struct FakeWeather {
        series: WeatherSeries,
        requests: Mutex<Vec<SeriesRequest>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn series(&self, _coordinate: Coordinate, request: SeriesRequest) -> Result<WeatherSeries> {
            self.requests.lock().unwrap().push(request);
            Ok(self.series.clone())
        }
    }

    fn two_day_series() -> WeatherSeries {
        WeatherSeries {
            time: vec![
                "2024-01-02T00:00".to_string(),
                "2024-01-01T00:00".to_string(),
                "2024-01-01T12:00".to_string(),
            ],
            temperature_2m: vec![Some(5.0), Some(10.0), Some(20.0)],
            humidity: vec![Some(90.0), Some(70.0), Some(50.0)],
            wind_speed: vec![Some(1.0), Some(2.0), Some(4.0)],
            precipitation: vec![Some(0.0), Some(1.2), Some(0.3)],
            shortwave_radiation: vec![Some(0.0), Some(10.0), Some(300.0)],
        }
    }

    fn submission(historical: Option<DateRange>) -> Submission {
        Submission {
            coordinate: Coordinate::new(52.52, 13.41),
            display_name: "Berlin, Germany".to_string(),
            historical,
        }
    }

    fn fake(series: WeatherSeries) -> Arc<FakeWeather> {
        Arc::new(FakeWeather {
            series,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_forecast_report() {
        let weather = fake(two_day_series());
        let dashboard = Dashboard::new(weather.clone(), 7);

        let report = dashboard.load(&submission(None)).await.unwrap();
        assert_eq!(report.mode, ReportMode::Forecast { days: 7 });
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[0].date, "2024-01-01");
        assert_eq!(report.daily[0].avg_temp, 15.0);
        assert_eq!(report.daily[0].total_precipitation, 1.5);
        assert_eq!(report.daily[1].avg_temp, 5.0);

        let overall = report.overall.unwrap();
        assert_eq!(overall.max_temp, 20.0);
        assert_eq!(overall.min_temp, 5.0);

        assert_eq!(
            *weather.requests.lock().unwrap(),
            vec![SeriesRequest::Forecast { days: 7 }]
        );
    }

    #[tokio::test]
    async fn test_historical_report_requests_range() {
        let weather = fake(two_day_series());
        let dashboard = Dashboard::new(weather.clone(), 7);
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };

        let report = dashboard.load(&submission(Some(range))).await.unwrap();
        assert_eq!(
            report.mode,
            ReportMode::Historical {
                start: range.start,
                end: range.end
            }
        );
        assert_eq!(
            *weather.requests.lock().unwrap(),
            vec![SeriesRequest::Historical(range)]
        );
    }

    #[tokio::test]
    async fn test_recent_report() {
        let weather = fake(two_day_series());
        let dashboard = Dashboard::new(weather.clone(), 7);
        let report = dashboard.load_recent(&submission(None), 10).await.unwrap();
        assert_eq!(report.mode, ReportMode::Recent { days: 10 });
        assert!(report.has_data());
    }

    #[tokio::test]
    async fn test_empty_series_is_no_data() {
        let dashboard = Dashboard::new(fake(WeatherSeries::default()), 7);
        let report = dashboard.load(&submission(None)).await.unwrap();
        assert!(!report.has_data());
        assert!(report.overall.is_none());
    }

    #[test]
    fn test_report_mode_serialization() {
        let json = serde_json::to_string(&ReportMode::Forecast { days: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"forecast","days":3}"#);
    }
}
