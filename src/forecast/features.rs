//! Feature encoding for the carbon-intensity model.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use super::types::WeatherSample;

/// Number of model input features per hour.
pub const FEATURE_WIDTH: usize = 6;

/// Model input for one hour, in the field order the model was trained on:
/// `[hour, month, day_of_week, temperature, shortwave_radiation, wind_speed]`.
///
/// `month` is 1-12 and `day_of_week` counts from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(pub [f32; FEATURE_WIDTH]);

impl FeatureVector {
    pub fn hour_of_day(&self) -> f32 {
        self.0[0]
    }

    pub fn month(&self) -> f32 {
        self.0[1]
    }

    pub fn day_of_week(&self) -> f32 {
        self.0[2]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Encodes one hourly weather sample into a model feature vector.
///
/// Calendar fields come from `timestamp`; measurements from `sample`.
/// Measurements must be finite, which is the weather source's contract.
pub fn encode(timestamp: NaiveDateTime, sample: &WeatherSample) -> FeatureVector {
    FeatureVector([
        timestamp.hour() as f32,
        timestamp.month() as f32,
        timestamp.weekday().num_days_from_sunday() as f32,
        sample.temperature_c as f32,
        sample.shortwave_radiation as f32,
        sample.wind_speed as f32,
    ])
}

/// Positionally ordered batch of feature vectors, shape `(len, FEATURE_WIDTH)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureBatch {
    rows: Vec<FeatureVector>,
}

impl FeatureBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: FeatureVector) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Row-major flat buffer of `len * FEATURE_WIDTH` values.
    pub fn to_flat(&self) -> Vec<f32> {
        self.rows.iter().flat_map(|row| row.0).collect()
    }
}

impl FromIterator<FeatureVector> for FeatureBatch {
    fn from_iter<I: IntoIterator<Item = FeatureVector>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(timestamp: NaiveDateTime) -> WeatherSample {
        WeatherSample {
            timestamp,
            temperature_c: 11.5,
            shortwave_radiation: 320.0,
            wind_speed: 18.25,
        }
    }

    #[test]
    fn encodes_fields_in_model_order() {
        // 2025-03-14 is a Friday.
        let ts = NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(15, 0, 0))
            .expect("valid timestamp");
        let v = encode(ts, &sample(ts));
        assert_eq!(v.0, [15.0, 3.0, 5.0, 11.5, 320.0, 18.25]);
    }

    #[test]
    fn sunday_is_day_zero_and_january_is_one() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let v = encode(ts, &sample(ts));
        assert_eq!(v.day_of_week(), 0.0);
        assert_eq!(v.month(), 1.0);
        assert_eq!(v.hour_of_day(), 0.0);
    }

    #[test]
    fn flat_buffer_is_row_major() {
        let batch: FeatureBatch = [
            FeatureVector([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            FeatureVector([7.0, 8.0, 9.0, 10.0, 11.0, 12.0]),
        ]
        .into_iter()
        .collect();
        let flat = batch.to_flat();
        assert_eq!(flat.len(), 2 * FEATURE_WIDTH);
        assert_eq!(flat[6], 7.0);
        assert_eq!(flat[11], 12.0);
    }
}
