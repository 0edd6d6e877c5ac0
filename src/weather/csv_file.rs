use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{HourlyWeather, Location, WeatherError, WeatherSource};
use crate::forecast::WeatherSample;

/// Weather read from a local CSV file, ignoring the requested location.
///
/// Expected columns: `timestamp,temperature_c,shortwave_radiation,wind_speed`
/// with timestamps as `YYYY-MM-DDTHH:MM` in the location's local time.
#[derive(Debug, Clone)]
pub struct CsvWeather {
    path: PathBuf,
    utc_offset_seconds: i32,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    temperature_c: f64,
    shortwave_radiation: f64,
    wind_speed: f64,
}

impl CsvWeather {
    pub fn new(path: impl Into<PathBuf>, utc_offset_seconds: i32) -> Self {
        Self {
            path: path.into(),
            utc_offset_seconds,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses CSV rows from any reader.
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::Csv` for unparseable rows and
    /// `WeatherError::Malformed` for bad timestamps or non-finite values.
    pub fn parse(reader: impl Read, utc_offset_seconds: i32) -> Result<HourlyWeather, WeatherError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut samples = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvRow = row?;
            let timestamp = NaiveDateTime::parse_from_str(&row.timestamp, "%Y-%m-%dT%H:%M")
                .map_err(|e| {
                    WeatherError::Malformed(format!("bad timestamp \"{}\": {e}", row.timestamp))
                })?;
            if ![row.temperature_c, row.shortwave_radiation, row.wind_speed]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(WeatherError::Malformed(format!(
                    "non-finite measurement at {}",
                    row.timestamp
                )));
            }
            samples.push(WeatherSample {
                timestamp,
                temperature_c: row.temperature_c,
                shortwave_radiation: row.shortwave_radiation,
                wind_speed: row.wind_speed,
            });
        }
        Ok(HourlyWeather::new(utc_offset_seconds, samples))
    }
}

#[async_trait]
impl WeatherSource for CsvWeather {
    async fn hourly(&self, _location: Location) -> Result<HourlyWeather, WeatherError> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|source| WeatherError::Io {
                path: self.path.clone(),
                source,
            })?;
        Self::parse(content.as_slice(), self.utc_offset_seconds)
    }
}
