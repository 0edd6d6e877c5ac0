//! Weather-driven carbon-intensity forecasting.

pub mod builder;
pub mod features;
pub mod store;
pub mod types;

pub use builder::{DEFAULT_HORIZON_HOURS, ForecastBuilder};
pub use features::{FEATURE_WIDTH, FeatureBatch, FeatureVector, encode};
pub use store::{ForecastSnapshot, ForecastStore, PublishOutcome, RefreshTicket};
pub use types::{ForecastPoint, GridCondition, GridLevel, WeatherSample, hour_label};

use crate::model::ModelError;
use crate::weather::WeatherError;

/// Upstream data could not be turned into a forecast.
///
/// The published forecast is left untouched when any of these occur.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Inference(#[from] ModelError),
    #[error("model returned {actual} estimates for {expected} hours")]
    OutputLength { expected: usize, actual: usize },
    #[error("model returned non-finite estimate {value} at hour {index}")]
    NonFiniteEstimate { index: usize, value: f32 },
}
