// Domain layer - Pure models and scoring rules
pub mod anomaly;
pub mod date;
pub mod scoring;
pub mod telemetry;
pub mod user;
pub mod window;
