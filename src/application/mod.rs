// Application layer - Use cases and the seams they depend on
pub mod anomaly_service;
pub mod auth_service;
pub mod inference;
pub mod telemetry_source;
pub mod user_repository;
