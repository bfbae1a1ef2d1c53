//! HTTP API for the account resource, health, and metrics.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod security;

pub use error::{ApiError, ErrorEnvelope};
pub use handlers::AppState;
pub use routes::create_router;
