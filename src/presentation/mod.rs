// Presentation layer - HTTP surface
pub mod app_state;
pub mod auth;
pub mod auth_handlers;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
