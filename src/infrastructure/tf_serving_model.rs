// Reconstruction model served over a TensorFlow Serving style REST API
use crate::application::inference::{InferenceError, ReconstructionModel};
use crate::domain::window::Window;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body: `(batch, time_steps, 1)`, the shape the models were trained on
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Vec<[f64; 1]>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone)]
pub struct TfServingModel {
    client: reqwest::Client,
    endpoint: String,
}

impl TfServingModel {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn encode(windows: &[Window]) -> PredictRequest {
        PredictRequest {
            instances: windows
                .iter()
                .map(|w| w.values.iter().map(|v| [*v]).collect())
                .collect(),
        }
    }

    /// Drop the trailing feature axis; every step must carry exactly one value
    fn decode(response: PredictResponse) -> Result<Vec<Vec<f64>>, InferenceError> {
        response
            .predictions
            .into_iter()
            .map(|steps| {
                steps
                    .into_iter()
                    .map(|features| match features.as_slice() {
                        [value] => Ok(*value),
                        other => Err(InferenceError::OutputShape(format!(
                            "{} features per step, expected 1",
                            other.len()
                        ))),
                    })
                    .collect::<Result<Vec<f64>, InferenceError>>()
            })
            .collect()
    }
}

#[async_trait]
impl ReconstructionModel for TfServingModel {
    async fn reconstruct(&self, windows: &[Window]) -> Result<Vec<Vec<f64>>, InferenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Self::encode(windows))
            .send()
            .await
            .map_err(|e| InferenceError::Model(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Model(format!(
                "model server returned {}: {}",
                status, body
            )));
        }

        let decoded = response
            .json::<PredictResponse>()
            .await
            .map_err(|e| InferenceError::Model(format!("unreadable prediction: {}", e)))?;

        Self::decode(decoded)
    }
}
