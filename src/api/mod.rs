//! HTTP surface.

pub mod error;
pub mod routes;

pub use error::{ApiError, status_for};
pub use routes::{AppState, cors_layer, notification_routes};
