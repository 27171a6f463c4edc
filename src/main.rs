// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::anomaly_service::{AnomalyService, SignalProfile};
use crate::application::auth_service::AuthService;
use crate::application::inference::{InferenceAdapter, ReconstructionModel};
use crate::domain::telemetry::SignalKind;
use crate::infrastructure::config::{load_service_config, AuthSettings, ServiceConfig};
use crate::infrastructure::http_telemetry_source::HttpTelemetrySource;
use crate::infrastructure::memory_user_repository::InMemoryUserRepository;
use crate::infrastructure::password::PasswordHasher;
use crate::infrastructure::tf_serving_model::TfServingModel;
use crate::infrastructure::token::TokenIssuer;
use crate::presentation::router::build_router;

fn signal_profile(config: &ServiceConfig, kind: SignalKind) -> anyhow::Result<SignalProfile> {
    let settings = config.signals.get(kind);
    let model: Arc<dyn ReconstructionModel> = Arc::new(TfServingModel::new(
        settings.model_url.clone(),
        Duration::from_secs(config.inference.timeout_secs),
    )?);

    Ok(SignalProfile {
        kind,
        payload_key: settings
            .payload_key
            .clone()
            .unwrap_or_else(|| kind.key().to_string()),
        rule: settings.rule(),
        adapter: InferenceAdapter::new(
            model,
            settings.input_width.unwrap_or(config.pipeline.time_steps),
        ),
    })
}

async fn auth_service(settings: &AuthSettings) -> anyhow::Result<AuthService> {
    let auth = AuthService::new(
        Arc::new(InMemoryUserRepository::new()),
        PasswordHasher::default(),
        TokenIssuer::new(
            settings.jwt_secret.expose(),
            chrono::Duration::seconds(settings.token_ttl_secs),
        ),
    );

    match (&settings.admin_username, &settings.admin_password) {
        (Some(username), Some(password)) => {
            if auth.ensure_admin(username, password.expose()).await? {
                tracing::info!(username = %username, "Admin user created");
            }
        }
        _ => tracing::warn!("No admin credentials configured; user management is unreachable"),
    }

    Ok(auth)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_service_config()?;

    // Create telemetry source and models (infrastructure layer)
    let source = Arc::new(HttpTelemetrySource::new(&config.telemetry)?);
    let conductivity = signal_profile(&config, SignalKind::Conductivity)?;
    let salinity = signal_profile(&config, SignalKind::Salinity)?;

    // Create services (application layer)
    let anomaly_service = AnomalyService::new(
        source,
        conductivity,
        salinity,
        config.pipeline.time_steps,
        config.pipeline.value_alignment,
    );
    let auth = match &config.auth {
        Some(settings) => Some(auth_service(settings).await?),
        None => {
            tracing::warn!("Auth section missing; prediction endpoints are unauthenticated");
            None
        }
    };

    // Build router (presentation layer)
    let router = build_router(anomaly_service, auth)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(
        %addr,
        device = %config.telemetry.device_id,
        alignment = ?config.pipeline.value_alignment,
        "Starting anomaly detection service"
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
