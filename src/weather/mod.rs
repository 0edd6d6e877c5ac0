//! Hourly weather collaborators.
//!
//! A [`WeatherSource`] resolves a coordinate into an [`HourlyWeather`]
//! table. Hours the source cannot supply are simply absent from the table;
//! the forecast builder treats the first gap as the end of available data.

mod csv_file;
mod open_meteo;

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::WeatherSample;

pub use csv_file::CsvWeather;
pub use open_meteo::{DEFAULT_BASE_URL, OpenMeteo};

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Errors raised while obtaining weather data.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed weather data: {0}")]
    Malformed(String),
    #[error("cannot read weather file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid weather CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Provider of hourly weather for a location.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn hourly(&self, location: Location) -> Result<HourlyWeather, WeatherError>;
}

/// Hourly weather samples keyed by local timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyWeather {
    utc_offset_seconds: i32,
    samples: Vec<WeatherSample>,
}

impl HourlyWeather {
    /// Builds a table from samples in any order; later duplicates of the
    /// same hour are dropped.
    pub fn new(utc_offset_seconds: i32, mut samples: Vec<WeatherSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        Self {
            utc_offset_seconds,
            samples,
        }
    }

    /// Sample for the hour starting at `hour`, if the source provided one.
    pub fn sample_at(&self, hour: NaiveDateTime) -> Option<&WeatherSample> {
        self.samples
            .binary_search_by_key(&hour, |s| s.timestamp)
            .ok()
            .map(|idx| &self.samples[idx])
    }

    /// Offset of the location's local time from UTC.
    pub fn utc_offset_seconds(&self) -> i32 {
        self.utc_offset_seconds
    }

    /// Converts an instant into the naive local time used by the samples.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match FixedOffset::east_opt(self.utc_offset_seconds) {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.naive_utc(),
        }
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
