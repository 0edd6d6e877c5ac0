//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use gridslot::advisor::CarbonAdvisor;
use gridslot::appliance::{ApplianceProfile, StaticCatalog};
use gridslot::forecast::{ForecastBuilder, ForecastPoint, WeatherSample};
use gridslot::model::LinearModel;
use gridslot::schedule::{BehaviorClass, SlotOptimizer};
use gridslot::weather::{HourlyWeather, Location, WeatherError, WeatherSource};

/// 2024-05-01 at `hour`:00.
pub fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid timestamp")
}

/// Forecast series with consecutive hours starting at `start_hour`.
pub fn series_from(values: &[u32], start_hour: u32) -> Vec<ForecastPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| ForecastPoint::new(at(start_hour) + TimeDelta::hours(i as i64), v))
        .collect()
}

/// Model whose estimate equals the temperature feature.
pub fn identity_model() -> LinearModel {
    LinearModel::new(0.0, [0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
}

/// Hourly weather whose temperatures are the given intensities.
pub fn weather_from(start: NaiveDateTime, intensities: &[f64]) -> HourlyWeather {
    let samples = intensities
        .iter()
        .enumerate()
        .map(|(i, &ci)| WeatherSample {
            timestamp: start + TimeDelta::hours(i as i64),
            temperature_c: ci,
            shortwave_radiation: 0.0,
            wind_speed: 0.0,
        })
        .collect();
    HourlyWeather::new(0, samples)
}

/// One scripted answer of a [`ScriptedWeather`].
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub intensities: Option<Vec<f64>>,
}

impl Reply {
    pub fn ok(intensities: Vec<f64>) -> Self {
        Self {
            delay: Duration::ZERO,
            intensities: Some(intensities),
        }
    }

    pub fn fail() -> Self {
        Self {
            delay: Duration::ZERO,
            intensities: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Weather source answering calls in order; the last reply repeats.
#[derive(Debug)]
pub struct ScriptedWeather {
    start: NaiveDateTime,
    replies: Vec<Reply>,
    calls: AtomicUsize,
}

impl ScriptedWeather {
    pub fn new(start: NaiveDateTime, replies: Vec<Reply>) -> Self {
        Self {
            start,
            replies,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for ScriptedWeather {
    async fn hourly(&self, _location: Location) -> Result<HourlyWeather, WeatherError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .get(n.min(self.replies.len().saturating_sub(1)))
            .cloned()
            .unwrap_or_else(Reply::fail);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        match reply.intensities {
            Some(values) => Ok(weather_from(self.start, &values)),
            None => Err(WeatherError::Malformed("scripted failure".to_string())),
        }
    }
}

/// Catalog with a 1.2 kW unattended dishwasher and a 0.5 kW attended laundry.
pub fn household_catalog() -> StaticCatalog {
    [
        (
            "Dishwasher",
            ApplianceProfile {
                power_kw: 1.2,
                behavior: BehaviorClass::Unattended,
            },
        ),
        (
            "Laundry",
            ApplianceProfile {
                power_kw: 0.5,
                behavior: BehaviorClass::Attended,
            },
        ),
    ]
    .into_iter()
    .collect()
}

/// Advisor over `weather`, the identity model and the household catalog.
pub fn advisor_with(weather: Arc<dyn WeatherSource>) -> CarbonAdvisor {
    CarbonAdvisor::new(
        weather,
        Arc::new(identity_model()),
        Arc::new(household_catalog()),
        ForecastBuilder::default(),
        SlotOptimizer::default(),
    )
}

pub fn london() -> Location {
    Location::new(51.5074, -0.1278)
}

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
