use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CarbonModel, ModelError};
use crate::forecast::{FeatureBatch, FeatureVector};

/// Model served over HTTP.
///
/// Request body: `{"inputs": [[f32; 6], ...]}`.
/// Response body: `{"outputs": [f32, ...]}`.
#[derive(Debug, Clone)]
pub struct RemoteModel {
    endpoint: String,
    http: Client,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a [FeatureVector],
}

#[derive(Deserialize)]
struct PredictResponse {
    outputs: Vec<f32>,
}

impl RemoteModel {
    /// # Errors
    ///
    /// Returns `ModelError::Request` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl CarbonModel for RemoteModel {
    async fn predict(&self, batch: &FeatureBatch) -> Result<Vec<f32>, ModelError> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&PredictRequest {
                inputs: batch.rows(),
            })
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: PredictResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::Malformed(format!("cannot parse response JSON: {e}")))?;
        Ok(parsed.outputs)
    }
}
