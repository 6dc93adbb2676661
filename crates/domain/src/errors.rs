//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Main error type for the back office
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BackofficeError {
    /// Bad input shape or enum value, caught before any remote call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, expired or rejected credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-2xx answer from QuickBooks, payload kept verbatim.
    #[error("QuickBooks error (HTTP {}): {}", .0.status, .0.summary())]
    Remote(RemoteFault),

    /// Stale `SyncToken` on an upstream write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A referenced local record (customer, driver, vehicle, order) is absent.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for back office operations
pub type Result<T> = std::result::Result<T, BackofficeError>;

/// Structured fault returned by the QuickBooks API.
///
/// `body` is the provider's JSON exactly as received, usually shaped as
/// `{"Fault": {"Error": [{"Message", "Detail", "code"}], "type"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFault {
    pub status: u16,
    pub body: Value,
}

impl RemoteFault {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn errors(&self) -> impl Iterator<Item = &Value> {
        self.body
            .get("Fault")
            .and_then(|fault| fault.get("Error"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }

    /// Every `Fault.Error[].Message`, in provider order.
    pub fn messages(&self) -> Vec<String> {
        self.errors()
            .filter_map(|err| err.get("Message").and_then(Value::as_str))
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Provider error codes (`Fault.Error[].code`).
    pub fn codes(&self) -> Vec<String> {
        self.errors()
            .filter_map(|err| match err.get("code") {
                Some(Value::String(code)) => Some(code.clone()),
                Some(Value::Number(code)) => Some(code.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Human readable text: `Detail` when present, else `Message`.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .errors()
            .filter_map(|err| {
                err.get("Detail")
                    .and_then(Value::as_str)
                    .or_else(|| err.get("Message").and_then(Value::as_str))
                    .map(ToOwned::to_owned)
            })
            .collect();

        if parts.is_empty() {
            match &self.body {
                Value::String(text) if !text.is_empty() => text.clone(),
                Value::Null => "no response body".to_string(),
                other => other.to_string(),
            }
        } else {
            parts.join("; ")
        }
    }
}

impl BackofficeError {
    /// Stable label for logs and sync log rows.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Auth(_) => "auth",
            Self::Remote(_) => "remote",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Integrity(_) => "integrity",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Internal(_) => "internal",
        }
    }
}
