//! Plain-text and JSON views of a dashboard report

use std::fmt::Write as _;

use anyhow::Result;

use crate::dashboard::{DashboardReport, ReportMode};
use crate::models::{DailySummary, OverallSummary};

pub const NO_DATA_MESSAGE: &str = "No data available";

fn mode_title(mode: &ReportMode) -> String {
    match mode {
        ReportMode::Forecast { days } => format!("{days}-day forecast"),
        ReportMode::Recent { days } => format!("Last {days} days"),
        ReportMode::Historical { start, end } => format!("Historical {start} to {end}"),
    }
}

fn format_row(day: &DailySummary) -> String {
    format!(
        "{:<8}{:>8.1}{:>8.1}{:>8.1}{:>8.0}{:>8.1}{:>8.1}{:>8.0}",
        day.date_label(),
        day.avg_temp,
        day.min_temp,
        day.max_temp,
        day.avg_humidity,
        day.avg_wind_speed,
        day.total_precipitation,
        day.avg_radiation,
    )
}

fn format_overall(out: &mut String, overall: &OverallSummary) {
    let _ = writeln!(out, "Overall ({} days)", overall.days);
    let _ = writeln!(
        out,
        "  Temperature   avg {:.1}°C  min {:.1}°C  max {:.1}°C",
        overall.avg_temp, overall.min_temp, overall.max_temp
    );
    let _ = writeln!(out, "  Humidity      avg {:.0}%", overall.avg_humidity);
    let _ = writeln!(out, "  Wind          avg {:.1} m/s", overall.avg_wind_speed);
    let _ = writeln!(out, "  Precipitation total {:.1} mm", overall.total_precipitation);
    let _ = writeln!(
        out,
        "  Radiation     avg {:.0} W/m²  max {:.0} W/m²",
        overall.avg_radiation, overall.max_radiation
    );
}

/// Fixed-width table, one line per day, followed by the overall block
#[must_use]
pub fn format_table(report: &DashboardReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({})",
        report.location_name,
        report.coordinate.format_degrees()
    );
    let _ = writeln!(out, "{}", mode_title(&report.mode));
    out.push('\n');

    if !report.has_data() {
        let _ = writeln!(out, "{NO_DATA_MESSAGE}");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
        "Date", "Avg°C", "Min°C", "Max°C", "RH%", "m/s", "mm", "W/m²"
    );
    for day in &report.daily {
        let _ = writeln!(out, "{}", format_row(day));
    }

    if let Some(overall) = &report.overall {
        out.push('\n');
        format_overall(&mut out, overall);
    }
    out
}

/// Pretty-printed JSON of the whole report
pub fn format_json(report: &DashboardReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
