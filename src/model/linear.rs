use async_trait::async_trait;

use super::{CarbonModel, ModelError};
use crate::forecast::{FEATURE_WIDTH, FeatureBatch};

/// Affine model `intercept + weights · features`.
///
/// Used when no trained model is reachable; coefficients come from config.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f32,
    pub weights: [f32; FEATURE_WIDTH],
}

impl LinearModel {
    pub fn new(intercept: f32, weights: [f32; FEATURE_WIDTH]) -> Self {
        Self { intercept, weights }
    }
}

#[async_trait]
impl CarbonModel for LinearModel {
    async fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f32>, ModelError> {
        Ok(batch
            .rows()
            .iter()
            .map(|row| {
                row.0
                    .iter()
                    .zip(self.weights.iter())
                    .fold(self.intercept, |acc, (x, w)| acc + x * w)
            })
            .collect())
    }
}
