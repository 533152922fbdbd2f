//! Daily aggregation of sub-daily weather samples
//!
//! Samples are bucketed by the calendar date encoded in their timestamp
//! string (no timezone conversion), reduced to one [`DailySummary`] per date
//! and then, optionally, to a single [`OverallSummary`].

use std::collections::BTreeMap;

use crate::models::{DailySummary, OverallSummary, WeatherSample};

/// Round the exact stored value to one decimal place, ties away from zero.
///
/// `{:.1}` formatting rounds the exact binary value (so `0.15`, stored just
/// below 0.15, gives 0.1) but breaks exact ties to even. An exact tie needs a
/// fractional part of .25 or .75, where scaling by ten is exact, so those
/// are rounded separately.
#[must_use]
pub fn round1(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let scaled = value * 10.0;
    if (value * 4.0).fract() == 0.0 && scaled.fract().abs() == 0.5 {
        return scaled.round() / 10.0;
    }
    format!("{value:.1}").parse().unwrap_or(value)
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[derive(Debug)]
struct DayAccumulator {
    temp_sum: f64,
    max_temp: f64,
    min_temp: f64,
    humidity_sum: f64,
    wind_sum: f64,
    precipitation: f64,
    radiation_sum: f64,
    count: usize,
}

impl DayAccumulator {
    fn new() -> Self {
        Self {
            temp_sum: 0.0,
            max_temp: f64::NEG_INFINITY,
            min_temp: f64::INFINITY,
            humidity_sum: 0.0,
            wind_sum: 0.0,
            precipitation: 0.0,
            radiation_sum: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, sample: &WeatherSample) {
        self.temp_sum += sample.temperature;
        self.max_temp = self.max_temp.max(sample.temperature);
        self.min_temp = self.min_temp.min(sample.temperature);
        self.humidity_sum += sample.humidity;
        self.wind_sum += sample.wind_speed;
        self.precipitation += sample.precipitation;
        self.radiation_sum += sample.radiation;
        self.count += 1;
    }

    fn finish(self, date: String) -> DailySummary {
        DailySummary {
            date,
            avg_temp: round1(mean(self.temp_sum, self.count)),
            max_temp: round1(self.max_temp),
            min_temp: round1(self.min_temp),
            avg_humidity: round1(mean(self.humidity_sum, self.count)),
            avg_wind_speed: round1(mean(self.wind_sum, self.count)),
            total_precipitation: round1(self.precipitation),
            avg_radiation: round1(mean(self.radiation_sum, self.count)),
            samples: self.count,
        }
    }
}

/// Group samples by calendar date and summarize each day.
///
/// The result is sorted ascending by ISO date regardless of input order.
/// An empty slice yields an empty vector.
#[must_use]
pub fn aggregate_by_day(samples: &[WeatherSample]) -> Vec<DailySummary> {
    // ISO dates sort lexicographically in chronological order
    let mut days: BTreeMap<&str, DayAccumulator> = BTreeMap::new();

    for sample in samples {
        days.entry(sample.date())
            .or_insert_with(DayAccumulator::new)
            .add(sample);
    }

    days.into_iter()
        .map(|(date, acc)| acc.finish(date.to_string()))
        .collect()
}

/// Reduce daily summaries to overall statistics. `None` when `daily` is empty.
#[must_use]
pub fn summarize(daily: &[DailySummary]) -> Option<OverallSummary> {
    if daily.is_empty() {
        return None;
    }

    let days = daily.len();
    let sum = |field: fn(&DailySummary) -> f64| daily.iter().map(field).sum::<f64>();
    let max = |field: fn(&DailySummary) -> f64| daily.iter().map(field).fold(f64::NEG_INFINITY, f64::max);

    Some(OverallSummary {
        avg_temp: round1(mean(sum(|d| d.avg_temp), days)),
        max_temp: round1(max(|d| d.max_temp)),
        min_temp: round1(daily.iter().map(|d| d.min_temp).fold(f64::INFINITY, f64::min)),
        avg_humidity: round1(mean(sum(|d| d.avg_humidity), days)),
        avg_wind_speed: round1(mean(sum(|d| d.avg_wind_speed), days)),
        total_precipitation: round1(sum(|d| d.total_precipitation)),
        avg_radiation: round1(mean(sum(|d| d.avg_radiation), days)),
        max_radiation: round1(max(|d| d.avg_radiation)),
        days,
    })
}
