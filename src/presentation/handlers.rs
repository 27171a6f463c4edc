// HTTP request handlers
use crate::application::anomaly_service::SignalReport;
use crate::domain::telemetry::SignalKind;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use crate::presentation::extract::DateQuery;
use axum::{extract::State, Json};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Number of entries printed by the debug endpoints
const DEBUG_SAMPLE: usize = 5;

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "API is running and healthy" }))
}

fn field(kind: SignalKind, name: &str) -> String {
    format!("{}_{}", kind.key(), name)
}

/// Predictions keep the `(windows, time_steps, 1)` nesting of the model output
fn prediction_value(report: &SignalReport) -> Value {
    let nested: Vec<Vec<[f64; 1]>> = report
        .predictions
        .iter()
        .map(|window| window.iter().map(|v| [*v]).collect())
        .collect();
    json!(nested)
}

fn signal_body(report: &SignalReport, include_prediction: bool) -> Map<String, Value> {
    let kind = report.kind;
    let mut body = Map::new();
    if include_prediction {
        body.insert(field(kind, "prediction"), prediction_value(report));
    }
    body.insert(field(kind, "mae_loss"), json!(report.mae_loss));
    body.insert(field(kind, "time"), json!(report.times));
    body.insert(field(kind, "value"), json!(report.values));
    body.insert(field(kind, "anomaly"), json!(report.anomalies.clone().unwrap_or_default()));
    body
}

/// Reconstruction of every signal, without anomaly flags
pub async fn predict_anomaly(
    State(state): State<Arc<AppState>>,
    query: DateQuery,
) -> Result<Json<Value>, ApiError> {
    let range = query.range()?;
    let reports = state.anomaly_service.reconstruct_all(&range).await?;

    let mut body = Map::new();
    for report in &reports {
        body.insert(field(report.kind, "prediction"), prediction_value(report));
        body.insert(field(report.kind, "mae_loss"), json!(report.mae_loss));
        body.insert(field(report.kind, "time"), json!(report.times));
    }
    Ok(Json(Value::Object(body)))
}

async fn predict_signal(
    state: &AppState,
    query: &DateQuery,
    kind: SignalKind,
) -> Result<SignalReport, ApiError> {
    let range = query.range()?;
    Ok(state.anomaly_service.detect(kind, &range).await?)
}

pub async fn predict_conductivity(
    State(state): State<Arc<AppState>>,
    query: DateQuery,
) -> Result<Json<Value>, ApiError> {
    let report = predict_signal(&state, &query, SignalKind::Conductivity).await?;
    Ok(Json(Value::Object(signal_body(&report, false))))
}

pub async fn predict_salinity(
    State(state): State<Arc<AppState>>,
    query: DateQuery,
) -> Result<Json<Value>, ApiError> {
    let report = predict_signal(&state, &query, SignalKind::Salinity).await?;
    Ok(Json(Value::Object(signal_body(&report, false))))
}

fn log_diagnostics(report: &SignalReport) {
    let raw = report.values.len().min(DEBUG_SAMPLE);
    let windows = report.mae_loss.len().min(DEBUG_SAMPLE);

    tracing::debug!(signal = %report.kind, readings = report.values.len(), head = ?&report.values[..raw], "Raw series");
    tracing::debug!(signal = %report.kind, label_times = ?&report.times[..windows], "Window labels");
    for (i, prediction) in report.predictions.iter().take(DEBUG_SAMPLE).enumerate() {
        tracing::debug!(signal = %report.kind, window = i, ?prediction, "Model reconstruction");
    }
    tracing::debug!(signal = %report.kind, mae_loss = ?&report.mae_loss[..windows], "Reconstruction error");
    if let Some(anomalies) = &report.anomalies {
        tracing::debug!(signal = %report.kind, anomalies = ?&anomalies[..windows], "Anomaly flags");
    }
}

async fn debug_signal(
    state: &AppState,
    query: &DateQuery,
    kind: SignalKind,
) -> Result<Json<Value>, ApiError> {
    let report = predict_signal(state, query, kind).await?;
    log_diagnostics(&report);
    Ok(Json(Value::Object(signal_body(&report, true))))
}

/// Same as `predict_salinity`, plus raw predictions and debug-level diagnostics
pub async fn debug_salinity(
    State(state): State<Arc<AppState>>,
    query: DateQuery,
) -> Result<Json<Value>, ApiError> {
    debug_signal(&state, &query, SignalKind::Salinity).await
}

pub async fn debug_conductivity(
    State(state): State<Arc<AppState>>,
    query: DateQuery,
) -> Result<Json<Value>, ApiError> {
    debug_signal(&state, &query, SignalKind::Conductivity).await
}
