//! Account resource.
//!
//! This module handles:
//! - The stored `Account` record and its wire representation
//! - Payload validation for create and update requests

pub mod types;

pub use types::{Account, AccountId, AccountPayload, ValidationError};
