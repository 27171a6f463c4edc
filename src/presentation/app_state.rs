// Application state for HTTP handlers
use crate::application::anomaly_service::AnomalyService;

#[derive(Clone)]
pub struct AppState {
    pub anomaly_service: AnomalyService,
}
