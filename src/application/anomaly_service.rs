// Anomaly service - Fetch, window, reconstruct, score and classify a signal
use crate::application::inference::{InferenceAdapter, InferenceError};
use crate::application::telemetry_source::{FetchError, TelemetrySource};
use crate::domain::anomaly::{AnomalyRule, ClassifyError, ValueAlignment};
use crate::domain::date::DateRange;
use crate::domain::scoring::mean_absolute_errors;
use crate::domain::telemetry::{SignalKind, TelemetryPayload};
use crate::domain::window::create_sequences;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{} data not found in the response", .0.display_name())]
    MissingSignal(SignalKind),

    #[error("{kind} series is malformed: {reason}")]
    MalformedSignal { kind: SignalKind, reason: String },

    #[error("{kind} needs at least {required} readings, got {actual}")]
    InsufficientReadings {
        kind: SignalKind,
        required: usize,
        actual: usize,
    },

    #[error("{kind} inference failed: {source}")]
    Inference {
        kind: SignalKind,
        #[source]
        source: InferenceError,
    },

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Everything needed to score one signal
#[derive(Clone)]
pub struct SignalProfile {
    pub kind: SignalKind,
    pub payload_key: String,
    pub rule: AnomalyRule,
    pub adapter: InferenceAdapter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub kind: SignalKind,
    pub predictions: Vec<Vec<f64>>,
    pub mae_loss: Vec<f64>,
    pub times: Vec<String>,
    /// Full raw series as fetched
    pub values: Vec<f64>,
    /// Present only when classification was requested
    pub anomalies: Option<Vec<bool>>,
}

#[derive(Clone)]
pub struct AnomalyService {
    source: Arc<dyn TelemetrySource>,
    conductivity: SignalProfile,
    salinity: SignalProfile,
    time_steps: usize,
    alignment: ValueAlignment,
}

impl AnomalyService {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        conductivity: SignalProfile,
        salinity: SignalProfile,
        time_steps: usize,
        alignment: ValueAlignment,
    ) -> Self {
        Self {
            source,
            conductivity,
            salinity,
            time_steps,
            alignment,
        }
    }

    fn profile(&self, kind: SignalKind) -> &SignalProfile {
        match kind {
            SignalKind::Conductivity => &self.conductivity,
            SignalKind::Salinity => &self.salinity,
        }
    }

    /// Score and classify a single signal over the given range
    pub async fn detect(
        &self,
        kind: SignalKind,
        range: &DateRange,
    ) -> Result<SignalReport, PipelineError> {
        let payload = self.source.fetch(range).await?;
        let report = self.analyze(&payload, kind, true).await?;

        tracing::info!(
            signal = %kind,
            windows = report.mae_loss.len(),
            anomalies = report.anomalies.as_ref().map(|a| a.iter().filter(|f| **f).count()).unwrap_or(0),
            "Anomaly detection complete"
        );
        Ok(report)
    }

    /// Reconstruct every signal from a single fetch, without classification.
    /// The first failing signal aborts the whole request.
    pub async fn reconstruct_all(&self, range: &DateRange) -> Result<Vec<SignalReport>, PipelineError> {
        let payload = self.source.fetch(range).await?;

        let mut reports = Vec::with_capacity(SignalKind::ALL.len());
        for kind in SignalKind::ALL {
            reports.push(self.analyze(&payload, kind, false).await?);
        }
        Ok(reports)
    }

    /// Run the pipeline on an already fetched payload
    pub async fn analyze(
        &self,
        payload: &TelemetryPayload,
        kind: SignalKind,
        classify: bool,
    ) -> Result<SignalReport, PipelineError> {
        let profile = self.profile(kind);

        let readings = payload
            .readings(&profile.payload_key)
            .map_err(|e| PipelineError::MalformedSignal {
                kind,
                reason: e.to_string(),
            })?
            .ok_or(PipelineError::MissingSignal(kind))?;

        let windows = create_sequences(&readings, self.time_steps);
        if windows.is_empty() {
            return Err(PipelineError::InsufficientReadings {
                kind,
                required: self.time_steps + 1,
                actual: readings.len(),
            });
        }

        let predictions = profile
            .adapter
            .reconstruct(&windows)
            .await
            .map_err(|source| PipelineError::Inference { kind, source })?;

        let mae_loss = mean_absolute_errors(&windows, &predictions);
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();

        let anomalies = if classify {
            let paired = self
                .alignment
                .select(&values, self.time_steps, mae_loss.len())
                .ok_or(ClassifyError::LengthMismatch {
                    scores: mae_loss.len(),
                    values: values.len(),
                })?;
            Some(profile.rule.classify(&mae_loss, paired)?)
        } else {
            None
        };

        Ok(SignalReport {
            kind,
            predictions,
            mae_loss,
            times: windows.into_iter().map(|w| w.label_time).collect(),
            values,
            anomalies,
        })
    }
}
