//! Gate error types.
//!
//! Internal errors carry detail for the audit log; callers only ever see the
//! fixed messages in [`ErrorBody`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Caller-visible error messages
pub mod messages {
    pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";
    pub const INTERNAL_ERROR: &str = "Internal error";
}

/// Error body returned to callers: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Soft error for a type missing from the registry
    pub fn unknown_message_type() -> Self {
        Self::new(messages::UNKNOWN_MESSAGE_TYPE)
    }

    /// Generic error for any handler fault
    pub fn internal() -> Self {
        Self::new(messages::INTERNAL_ERROR)
    }

    pub fn into_value(self) -> serde_json::Value {
        serde_json::json!({ "error": self.error })
    }
}

/// Storage layer errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Backend not reachable or refused the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be decoded
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

/// Errors raised by message handlers.
///
/// The gate converts every variant into [`ErrorBody::internal`]; only the
/// `Display` text is written to the audit log.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("handler timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("handler panicked")]
    Panicked,

    #[error("{0}")]
    Internal(String),
}

/// Configuration loading/validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Gate construction and lifecycle errors (not caller-visible)
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Two handlers registered under one message type
    #[error("duplicate handler for message type {0:?}")]
    DuplicateHandler(String),

    /// Message type tag is empty or not `UPPER_SNAKE_CASE`
    #[error("invalid message type tag {0:?}")]
    InvalidMessageType(String),

    /// Audit log restore or flush failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("telemetry init failed: {0}")]
    Telemetry(String),
}

/// Result type for gate construction
pub type GateResult<T> = Result<T, GateError>;
