// Source trait for upstream telemetry data access
use crate::domain::date::DateRange;
use crate::domain::telemetry::TelemetryPayload;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-success status
    #[error("telemetry API returned status {status}")]
    Upstream { status: u16 },

    #[error("telemetry API unreachable: {0}")]
    Transport(String),

    #[error("telemetry API returned an undecodable body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch every series the device reports for the given range
    async fn fetch(&self, range: &DateRange) -> Result<TelemetryPayload, FetchError>;
}
