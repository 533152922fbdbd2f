//! Weather sample model and the parallel-array series it is built from

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One timestamped set of readings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSample {
    /// ISO-8601 local timestamp, e.g. `2024-01-01T13:00`
    pub timestamp: String,
    /// Temperature at 2 m in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed at 10 m in m/s
    pub wind_speed: f64,
    /// Precipitation in mm
    pub precipitation: f64,
    /// Shortwave solar radiation in W/m²
    pub radiation: f64,
}

impl WeatherSample {
    /// Calendar date as encoded in the timestamp (text before the `T`)
    #[must_use]
    pub fn date(&self) -> &str {
        self.timestamp
            .split_once('T')
            .map_or(self.timestamp.as_str(), |(date, _)| date)
    }
}

/// Hourly series as delivered by the weather service: parallel arrays
/// indexed by sample position. Missing readings are `None`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
    pub wind_speed: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub shortwave_radiation: Vec<Option<f64>>,
}

impl WeatherSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Zip the parallel arrays into samples. Positions where any reading is
    /// missing (null or array too short) are skipped.
    #[must_use]
    pub fn samples(&self) -> Vec<WeatherSample> {
        let reading = |values: &[Option<f64>], idx: usize| values.get(idx).copied().flatten();

        let samples: Vec<WeatherSample> = self
            .time
            .iter()
            .enumerate()
            .filter_map(|(idx, time)| {
                Some(WeatherSample {
                    timestamp: time.clone(),
                    temperature: reading(&self.temperature_2m, idx)?,
                    humidity: reading(&self.humidity, idx)?,
                    wind_speed: reading(&self.wind_speed, idx)?,
                    precipitation: reading(&self.precipitation, idx)?,
                    radiation: reading(&self.shortwave_radiation, idx)?,
                })
            })
            .collect();

        let skipped = self.time.len() - samples.len();
        if skipped > 0 {
            debug!("Skipped {} incomplete samples out of {}", skipped, self.time.len());
        }
        samples
    }
}
