//! Carbon-intensity inference collaborators.
//!
//! The model is a black box mapping a `(N, 6)` feature batch to `N`
//! positionally aligned intensity estimates in gCO2/kWh.

mod linear;
mod remote;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::forecast::FeatureBatch;

pub use linear::LinearModel;
pub use remote::RemoteModel;

/// Errors raised by an inference backend.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("inference service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed inference output: {0}")]
    Malformed(String),
}

/// Batched carbon-intensity predictor.
#[async_trait]
pub trait CarbonModel: Send + Sync + Debug {
    /// Returns one estimate per row of `batch`, in row order.
    async fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f32>, ModelError>;
}
