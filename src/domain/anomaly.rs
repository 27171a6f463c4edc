// Rule-based anomaly classification
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("score/value length mismatch: {scores} scores, {values} values")]
    LengthMismatch { scores: usize, values: usize },
}

/// Error threshold plus the physically plausible value range for a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyRule {
    pub error_threshold: f64,
    pub value_floor: f64,
    pub value_ceiling: f64,
}

impl AnomalyRule {
    pub const CONDUCTIVITY: AnomalyRule = AnomalyRule {
        error_threshold: 71.0,
        value_floor: 0.0,
        value_ceiling: 1000.0,
    };

    pub const SALINITY: AnomalyRule = AnomalyRule {
        error_threshold: 0.2,
        value_floor: 0.0,
        value_ceiling: 7.0,
    };

    /// Comparisons are strict: a score equal to the threshold, or a value
    /// sitting exactly on the floor or ceiling, is normal.
    pub fn is_anomalous(&self, score: f64, value: f64) -> bool {
        if score > self.error_threshold {
            true
        } else if value < self.value_floor {
            true
        } else {
            value > self.value_ceiling
        }
    }

    pub fn classify(&self, scores: &[f64], values: &[f64]) -> Result<Vec<bool>, ClassifyError> {
        if scores.len() != values.len() {
            return Err(ClassifyError::LengthMismatch {
                scores: scores.len(),
                values: values.len(),
            });
        }

        Ok(scores
            .iter()
            .zip(values)
            .map(|(score, value)| self.is_anomalous(*score, *value))
            .collect())
    }
}

/// Which raw value gets paired with each window's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueAlignment {
    /// Value at the window's own index (the first value inside the window).
    /// Kept for compatibility with existing consumers.
    #[default]
    Literal,
    /// Value at the window's label index, i.e. the reading right after it.
    Aligned,
}

impl ValueAlignment {
    /// Pick `window_count` values out of the full raw series.
    ///
    /// Returns `None` if the series is too short for the requested selection.
    pub fn select<'a>(
        &self,
        values: &'a [f64],
        time_steps: usize,
        window_count: usize,
    ) -> Option<&'a [f64]> {
        let start = match self {
            ValueAlignment::Literal => 0,
            ValueAlignment::Aligned => time_steps,
        };
        values.get(start..start + window_count)
    }
}
