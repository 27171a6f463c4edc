// Inference adapter around opaque reconstruction models
use crate::domain::window::Window;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference called with an empty batch")]
    EmptyBatch,

    #[error("window {index} has width {actual}, model expects {expected}")]
    WidthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("model returned {0}")]
    OutputShape(String),

    #[error("model failure: {0}")]
    Model(String),
}

/// A pre-trained sequence-to-sequence model: windows in, same-shaped
/// reconstructions out.
#[async_trait]
pub trait ReconstructionModel: Send + Sync {
    async fn reconstruct(&self, windows: &[Window]) -> Result<Vec<Vec<f64>>, InferenceError>;
}

/// Shape-checking wrapper around a shared model handle.
#[derive(Clone)]
pub struct InferenceAdapter {
    model: Arc<dyn ReconstructionModel>,
    input_width: usize,
}

impl InferenceAdapter {
    pub fn new(model: Arc<dyn ReconstructionModel>, input_width: usize) -> Self {
        Self { model, input_width }
    }

    pub async fn reconstruct(&self, windows: &[Window]) -> Result<Vec<Vec<f64>>, InferenceError> {
        if windows.is_empty() {
            return Err(InferenceError::EmptyBatch);
        }

        if let Some((index, window)) = windows
            .iter()
            .enumerate()
            .find(|(_, w)| w.width() != self.input_width)
        {
            return Err(InferenceError::WidthMismatch {
                index,
                expected: self.input_width,
                actual: window.width(),
            });
        }

        let reconstructions = self.model.reconstruct(windows).await?;

        if reconstructions.len() != windows.len() {
            return Err(InferenceError::OutputShape(format!(
                "{} reconstructions for {} windows",
                reconstructions.len(),
                windows.len()
            )));
        }
        if let Some(bad) = reconstructions.iter().find(|r| r.len() != self.input_width) {
            return Err(InferenceError::OutputShape(format!(
                "a reconstruction of width {}, expected {}",
                bad.len(),
                self.input_width
            )));
        }

        Ok(reconstructions)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Returns every window shifted by a constant offset.
    pub struct OffsetModel(pub f64);

    #[async_trait]
    impl ReconstructionModel for OffsetModel {
        async fn reconstruct(&self, windows: &[Window]) -> Result<Vec<Vec<f64>>, InferenceError> {
            Ok(windows
                .iter()
                .map(|w| w.values.iter().map(|v| v + self.0).collect())
                .collect())
        }
    }

    /// Drops the last value of every reconstruction.
    pub struct TruncatingModel;

    #[async_trait]
    impl ReconstructionModel for TruncatingModel {
        async fn reconstruct(&self, windows: &[Window]) -> Result<Vec<Vec<f64>>, InferenceError> {
            Ok(windows
                .iter()
                .map(|w| w.values[..w.values.len() - 1].to_vec())
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{OffsetModel, TruncatingModel};
    use super::*;

    fn window(width: usize) -> Window {
        Window {
            values: vec![1.0; width],
            label_time: "t".to_string(),
        }
    }

    #[tokio::test]
    async fn test_reconstructs_matching_batch() {
        let adapter = InferenceAdapter::new(Arc::new(OffsetModel(0.5)), 30);
        let out = adapter.reconstruct(&[window(30), window(30)]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.len() == 30 && r[0] == 1.5));
    }

    #[tokio::test]
    async fn test_empty_batch_fails() {
        let adapter = InferenceAdapter::new(Arc::new(OffsetModel(0.0)), 30);
        assert!(matches!(adapter.reconstruct(&[]).await, Err(InferenceError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_width_mismatch_fails() {
        let adapter = InferenceAdapter::new(Arc::new(OffsetModel(0.0)), 30);
        let err = adapter.reconstruct(&[window(30), window(20)]).await.unwrap_err();
        assert!(matches!(
            err,
            InferenceError::WidthMismatch { index: 1, expected: 30, actual: 20 }
        ));
    }

    #[tokio::test]
    async fn test_wrong_output_shape_fails() {
        let adapter = InferenceAdapter::new(Arc::new(TruncatingModel), 30);
        let err = adapter.reconstruct(&[window(30)]).await.unwrap_err();
        assert!(matches!(err, InferenceError::OutputShape(_)));
    }
}
