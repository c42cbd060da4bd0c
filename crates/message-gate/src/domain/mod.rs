//! Domain types for the Message Gate.
//!
//! Configuration, errors, request/sender types and the audit log.

pub mod audit;
pub mod config;
pub mod correlation;
pub mod envelope;
pub mod error;

// Re-exports for convenience
pub use audit::{actions, AuditLog, LogEntry};
pub use config::{
    AuditConfig, DispatchConfig, GateConfig, OriginConfig, RateLimitConfig,
    TelemetryConfig,
};
pub use correlation::RequestId;
pub use envelope::{CallerId, RequestEnvelope, SenderContext};
pub use error::{ConfigError, ErrorBody, GateError, GateResult, HandlerError, StorageError};
