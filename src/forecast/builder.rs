use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use super::ForecastError;
use super::features::{FeatureBatch, encode};
use super::types::ForecastPoint;
use crate::model::CarbonModel;
use crate::weather::HourlyWeather;

/// Default forecast horizon in hours.
pub const DEFAULT_HORIZON_HOURS: usize = 24;

/// Turns hourly weather into a carbon-intensity series.
///
/// # Examples
///
/// ```
/// use gridslot::forecast::ForecastBuilder;
///
/// let builder = ForecastBuilder::default();
/// assert_eq!(builder.horizon_hours(), 24);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ForecastBuilder {
    horizon_hours: usize,
}

impl Default for ForecastBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_HOURS)
    }
}

impl ForecastBuilder {
    pub fn new(horizon_hours: usize) -> Self {
        Self { horizon_hours }
    }

    pub fn horizon_hours(&self) -> usize {
        self.horizon_hours
    }

    /// Encodes consecutive hours starting at the hour containing `now`.
    ///
    /// Stops at the first hour `weather` has no sample for, so the result
    /// may be shorter than the horizon (or empty).
    pub fn collect_features(
        &self,
        now: NaiveDateTime,
        weather: &HourlyWeather,
    ) -> (Vec<NaiveDateTime>, FeatureBatch) {
        let start = start_of_hour(now);
        let mut hours = Vec::with_capacity(self.horizon_hours);
        let mut batch = FeatureBatch::with_capacity(self.horizon_hours);

        for i in 0..self.horizon_hours {
            let hour = start + TimeDelta::hours(i as i64);
            let Some(sample) = weather.sample_at(hour) else {
                tracing::debug!(
                    requested = self.horizon_hours,
                    available = i,
                    "weather data ends before forecast horizon"
                );
                break;
            };
            batch.push(encode(sample.timestamp, sample));
            hours.push(sample.timestamp);
        }

        (hours, batch)
    }

    /// Builds the forecast series with one batched inference call.
    ///
    /// Index 0 is the hour containing `now`. The call is all-or-nothing:
    /// any inference failure or shape mismatch yields an error and no
    /// points.
    ///
    /// # Errors
    ///
    /// * `ForecastError::Inference` if the model call fails
    /// * `ForecastError::OutputLength` if the model returns the wrong count
    /// * `ForecastError::NonFiniteEstimate` if an estimate is NaN or infinite
    pub async fn build<M>(
        &self,
        now: NaiveDateTime,
        weather: &HourlyWeather,
        model: &M,
    ) -> Result<Vec<ForecastPoint>, ForecastError>
    where
        M: CarbonModel + ?Sized,
    {
        let (hours, batch) = self.collect_features(now, weather);
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let estimates = model.predict(&batch).await?;
        if estimates.len() != batch.len() {
            return Err(ForecastError::OutputLength {
                expected: batch.len(),
                actual: estimates.len(),
            });
        }

        hours
            .into_iter()
            .zip(estimates)
            .enumerate()
            .map(|(index, (timestamp, value))| {
                if !value.is_finite() {
                    return Err(ForecastError::NonFiniteEstimate { index, value });
                }
                Ok(ForecastPoint::new(timestamp, clamp_intensity(value)))
            })
            .collect()
    }
}

/// Clamps a raw estimate to a non-negative integer intensity.
fn clamp_intensity(value: f32) -> u32 {
    value.max(0.0).round() as u32
}

fn start_of_hour(t: NaiveDateTime) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    NaiveDateTime::new(t.date(), time)
}
