// Telemetry data domain models
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single reading as delivered by the upstream telemetry feed.
///
/// A null or absent value becomes NaN and flows through scoring as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub time: String,
    #[serde(default = "missing_value", deserialize_with = "nan_if_null")]
    pub value: f64,
}

fn missing_value() -> f64 {
    f64::NAN
}

fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Reading {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Conductivity,
    Salinity,
}

impl SignalKind {
    pub const ALL: [SignalKind; 2] = [SignalKind::Conductivity, SignalKind::Salinity];

    /// Prefix used for the response fields of this signal
    pub fn key(&self) -> &'static str {
        match self {
            SignalKind::Conductivity => "conductivity",
            SignalKind::Salinity => "salinity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SignalKind::Conductivity => "Conductivity",
            SignalKind::Salinity => "Salinity",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw upstream response body, keyed by signal name.
///
/// Only the series that are actually requested get decoded, so unrelated
/// fields in the feed never fail a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TelemetryPayload {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl TelemetryPayload {
    /// Decode the series stored under `key`. `Ok(None)` when the key is absent.
    pub fn readings(&self, key: &str) -> Result<Option<Vec<Reading>>, serde_json::Error> {
        match self.fields.get(key) {
            Some(value) => Vec::<Reading>::deserialize(value).map(Some),
            None => Ok(None),
        }
    }
}
