//! Account record and request payload types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// Reasons an account payload is rejected.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Body is not valid JSON, or a known field has the wrong type.
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// Body parsed but is not a JSON object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// `name` was supplied as an empty string.
    #[error("field `name` must not be empty")]
    EmptyName,
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Identifier assigned by the store.
    #[schema(value_type = i64)]
    pub id: AccountId,
    /// Account holder name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Account {
    /// Build a record from a validated payload and a fresh id.
    pub fn from_payload(id: AccountId, payload: AccountPayload) -> Self {
        Self {
            id,
            name: payload.name,
            email: payload.email,
            address: payload.address,
            phone_number: payload.phone_number,
            active: payload.active,
        }
    }

    /// Overwrite fields present in `payload`. The id never changes and
    /// optional fields omitted from the payload keep their stored value.
    pub fn apply(&mut self, payload: AccountPayload) {
        self.name = payload.name;
        if payload.email.is_some() {
            self.email = payload.email;
        }
        if payload.address.is_some() {
            self.address = payload.address;
        }
        if payload.phone_number.is_some() {
            self.phone_number = payload.phone_number;
        }
        if payload.active.is_some() {
            self.active = payload.active;
        }
    }
}

/// Body of a create or update request.
///
/// `name` is required; the remaining fields are optional but must have the
/// right JSON type when present. Unknown keys (including `id`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AccountPayload {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl AccountPayload {
    /// Payload carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            address: None,
            phone_number: None,
            active: None,
        }
    }

    /// Parse and validate a raw request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        // Structs also deserialize from arrays, so reject non-objects up front.
        let kind = match &value {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
            Value::Array(_) => Some("an array"),
        };
        if let Some(kind) = kind {
            return Err(ValidationError::NotAnObject(kind));
        }

        let payload: Self = serde_json::from_value(value)?;
        if payload.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(payload)
    }
}
