//! Account REST API microservice.
//!
//! A small CRUD service over an "Account" resource: create, list, read,
//! update, and delete, plus health and index endpoints.
//!
//! # Request flow
//!
//! ```text
//! request ─► content-type check ─► payload validation ─► record store ─► JSON response
//!                  │                       │                    │
//!                  └──── 415 ──────────────┴──── 400 ───────────┴──── 404 / 500
//! ```
//!
//! Every failure leaves through [`api::ApiError`], which renders the uniform
//! `{status, error, message}` envelope.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`account`]: Account record and payload validation
//! - [`store`]: Record store trait and backends
//! - [`api`]: HTTP handlers, routing, error mapping, security headers
//! - [`metrics`]: Request and store metrics
//! - [`utils`]: Utility functions

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
