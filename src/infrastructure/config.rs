use crate::domain::anomaly::{AnomalyRule, ValueAlignment};
use crate::domain::telemetry::SignalKind;
use crate::domain::window::DEFAULT_TIME_STEPS;
use serde::Deserialize;
use std::fmt;

const CONFIG_FILE: &str = "config/service";
const ENV_PREFIX: &str = "ANOMALY";
/// HS256 keys shorter than the hash output are rejected
const MIN_JWT_SECRET_LEN: usize = 32;

/// Credential read from configuration. `Debug` never prints the value.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED {} bytes])", self.0.len())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    pub signals: SignalsConfig,
    /// Absent section disables authentication entirely
    #[serde(default)]
    pub auth: Option<AuthSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub url: String,
    pub username: String,
    pub password: Secret,
    pub device_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. Non-200 answers are never retried.
    #[serde(default)]
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineSettings {
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
    #[serde(default)]
    pub value_alignment: ValueAlignment,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            time_steps: DEFAULT_TIME_STEPS,
            value_alignment: ValueAlignment::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalsConfig {
    pub conductivity: SignalSettings,
    pub salinity: SignalSettings,
}

impl SignalsConfig {
    pub fn get(&self, kind: SignalKind) -> &SignalSettings {
        match kind {
            SignalKind::Conductivity => &self.conductivity,
            SignalKind::Salinity => &self.salinity,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalSettings {
    /// Key of the series in the upstream payload; defaults to the signal name
    pub payload_key: Option<String>,
    pub error_threshold: f64,
    #[serde(default)]
    pub value_floor: f64,
    pub value_ceiling: f64,
    /// Window width the model was trained on; defaults to `pipeline.time_steps`
    pub input_width: Option<usize>,
    pub model_url: String,
}

impl SignalSettings {
    pub fn rule(&self) -> AnomalyRule {
        AnomalyRule {
            error_threshold: self.error_threshold,
            value_floor: self.value_floor,
            value_ceiling: self.value_ceiling,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// Only ever supplied through `ANOMALY__AUTH__JWT_SECRET`
    pub jwt_secret: Secret,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    pub admin_username: Option<String>,
    pub admin_password: Option<Secret>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_time_steps() -> usize {
    DEFAULT_TIME_STEPS
}

fn default_token_ttl_secs() -> i64 {
    3600
}

impl ServiceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.pipeline.time_steps > 0, "pipeline.time_steps must be positive");

        for kind in SignalKind::ALL {
            let signal = self.signals.get(kind);
            anyhow::ensure!(
                signal.value_floor <= signal.value_ceiling,
                "signals.{}: value_floor {} is above value_ceiling {}",
                kind,
                signal.value_floor,
                signal.value_ceiling
            );
            anyhow::ensure!(!signal.model_url.is_empty(), "signals.{}.model_url is empty", kind);
        }

        if let Some(auth) = &self.auth {
            anyhow::ensure!(
                auth.jwt_secret.expose().len() >= MIN_JWT_SECRET_LEN,
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            );
            anyhow::ensure!(auth.token_ttl_secs > 0, "auth.token_ttl_secs must be positive");
        }
        Ok(())
    }
}

/// Load `config/service.toml`, then apply `ANOMALY__SECTION__KEY` overrides
pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let service_config: ServiceConfig = settings.try_deserialize()?;
    service_config.validate()?;
    Ok(service_config)
}
