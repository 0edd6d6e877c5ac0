//! Weather input and forecast output records.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One hourly weather observation as supplied by a weather source.
///
/// Timestamps are naive local times of the forecast location; the
/// source is responsible for resolving the timezone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Start of the hour this sample describes (local time).
    pub timestamp: NaiveDateTime,
    /// Air temperature at 2 m (°C).
    pub temperature_c: f64,
    /// Global horizontal shortwave irradiance (W/m²).
    pub shortwave_radiation: f64,
    /// Wind speed at 10 m (km/h).
    pub wind_speed: f64,
}

/// Predicted grid carbon intensity for one hour of the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Start of the hour (local time of the forecast location).
    pub timestamp: NaiveDateTime,
    /// Display label derived from `timestamp`, e.g. `"14:00"`.
    pub hour_label: String,
    /// Estimated intensity in gCO2/kWh, never negative.
    pub carbon_intensity: u32,
}

impl ForecastPoint {
    /// Creates a point, deriving the display label from the timestamp.
    pub fn new(timestamp: NaiveDateTime, carbon_intensity: u32) -> Self {
        Self {
            timestamp,
            hour_label: hour_label(timestamp),
            carbon_intensity,
        }
    }

    /// Hour of day (0-23) of the point's start.
    pub fn hour_of_day(&self) -> u32 {
        self.timestamp.hour()
    }
}

impl fmt::Display for ForecastPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}  {:>4} gCO2/kWh", self.hour_label, self.carbon_intensity)
    }
}

/// Formats the chart label for an hourly slot.
pub fn hour_label(timestamp: NaiveDateTime) -> String {
    format!("{}:00", timestamp.hour())
}

/// Coarse state of the grid for the current hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLevel {
    /// Below the green threshold.
    Low,
    /// At or above the green threshold.
    High,
}

/// Current-hour grid condition shown alongside the forecast chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCondition {
    pub level: GridLevel,
    pub carbon_intensity: u32,
}

impl GridCondition {
    /// Classifies the first point of a series against `green_threshold`.
    ///
    /// Returns `None` for an empty series.
    pub fn current(series: &[ForecastPoint], green_threshold: f64) -> Option<Self> {
        let now = series.first()?;
        let level = if f64::from(now.carbon_intensity) < green_threshold {
            GridLevel::Low
        } else {
            GridLevel::High
        };
        Some(Self {
            level,
            carbon_intensity: now.carbon_intensity,
        })
    }
}

impl fmt::Display for GridCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            GridLevel::Low => write!(
                f,
                "LOW ({} gCO2/kWh) - Good Condition: renewable generation is currently high.",
                self.carbon_intensity
            ),
            GridLevel::High => write!(
                f,
                "HIGH ({} gCO2/kWh) - Grid Strained: high demand is causing fossil fuel usage.",
                self.carbon_intensity
            ),
        }
    }
}
