use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use super::{HourlyWeather, Location, WeatherError, WeatherSource};
use crate::forecast::WeatherSample;

/// Default public Open-Meteo endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const HOURLY_FIELDS: &str = "temperature_2m,shortwave_radiation,wind_speed_10m";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Open-Meteo hourly forecast client.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    base_url: String,
    http: Client,
}

impl OpenMeteo {
    /// Creates a client against `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::Request` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteo {
    async fn hourly(&self, location: Location) -> Result<HourlyWeather, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("past_days", "0".to_string()),
                ("forecast_days", "2".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OmResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::Malformed(format!("cannot parse forecast JSON: {e}")))?;
        let weather = parsed.into_hourly()?;
        tracing::debug!(
            samples = weather.len(),
            offset_s = weather.utc_offset_seconds(),
            "fetched Open-Meteo hourly weather"
        );
        Ok(weather)
    }
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    shortwave_radiation: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: OmHourly,
}

impl OmResponse {
    /// Zips the parallel hourly arrays; hours with a null measurement are
    /// left out so they read as missing data downstream.
    fn into_hourly(self) -> Result<HourlyWeather, WeatherError> {
        let h = self.hourly;
        let n = h.time.len();
        if h.temperature_2m.len() != n
            || h.shortwave_radiation.len() != n
            || h.wind_speed_10m.len() != n
        {
            return Err(WeatherError::Malformed(format!(
                "hourly arrays differ in length: time={n}, temperature_2m={}, \
                 shortwave_radiation={}, wind_speed_10m={}",
                h.temperature_2m.len(),
                h.shortwave_radiation.len(),
                h.wind_speed_10m.len()
            )));
        }

        let mut samples = Vec::with_capacity(n);
        for (i, raw_time) in h.time.iter().enumerate() {
            let timestamp = NaiveDateTime::parse_from_str(raw_time, TIME_FORMAT).map_err(|e| {
                WeatherError::Malformed(format!("bad timestamp \"{raw_time}\": {e}"))
            })?;
            let (Some(temperature_c), Some(shortwave_radiation), Some(wind_speed)) = (
                h.temperature_2m[i],
                h.shortwave_radiation[i],
                h.wind_speed_10m[i],
            ) else {
                continue;
            };
            samples.push(WeatherSample {
                timestamp,
                temperature_c,
                shortwave_radiation,
                wind_speed,
            });
        }

        Ok(HourlyWeather::new(self.utc_offset_seconds, samples))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
