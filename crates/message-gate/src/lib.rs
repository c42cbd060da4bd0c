// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Message Gate - authorization boundary in front of privileged extension operations.
//!
//! Every inbound message passes an origin check, a per-caller sliding-window
//! rate limit and a closed handler registry. Each decision is written to a
//! bounded audit log.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        MESSAGE GATE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │   { type, data } + { origin, tabId }                         │
//! │                       │                                      │
//! │  ┌────────────────────┴───────────────────────┐             │
//! │  │                Gate Checks                  │             │
//! │  │      Origin prefix → Sliding-window rate     │             │
//! │  └────────────────────┬───────────────────────┘             │
//! │           rejected ───┤──► silent drop + audit entry        │
//! │  ┌────────────────────┴───────────────────────┐             │
//! │  │             Handler Registry                │             │
//! │  │  HEALTH_CHECK · GET_AUDIT_LOG · CLEAR_...   │             │
//! │  └────────────────────┬───────────────────────┘             │
//! │                       │                                      │
//! │  ┌────────────────────┴───────────────────────┐             │
//! │  │     Audit Log (bounded, oldest-first)       │             │
//! │  └────────────────────┬───────────────────────┘             │
//! └───────────────────────┼─────────────────────────────────────┘
//!                         │
//!              KeyValueStore / ConsentProvider / TimeSource
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use message_gate::{GateConfig, GateService, RequestEnvelope, SenderContext};
//!
//! let config = GateConfig::load("gate.toml")?;
//! let mut service = GateService::builder(config).build()?;
//! service.start().await?;
//!
//! let answer = service
//!     .handle(
//!         RequestEnvelope::new("HEALTH_CHECK"),
//!         SenderContext::new().with_origin("https://example.com").with_caller("tab-1"),
//!     )
//!     .await
//!     .into_response();
//! ```
//!
//! # Security
//!
//! - Rejected requests get no response at all
//! - Handler faults reach the caller only as `{"error": "Internal error"}`
//! - The limiter map is bounded by an LRU and swept periodically

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-exports for public API
pub use adapters::{AutoConsent, JsonFileStore, ManualClock, MemoryStore, StaticConsent, SystemTimeSource};
pub use domain::audit::{actions, AuditLog, LogEntry};
pub use domain::config::GateConfig;
pub use domain::envelope::{CallerId, RequestEnvelope, SenderContext};
pub use domain::error::{ErrorBody, GateError, GateResult, HandlerError, StorageError};
pub use gate::{Disposition, GateStage, MessageGate, RejectReason};
pub use handlers::{message_types, HandlerRegistry, MessageHandler, RequestContext};
pub use middleware::{GateMetrics, OriginValidator, RateLimitState};
pub use ports::{ConsentProvider, KeyValueStore, TimeSource};
pub use service::{GateService, GateServiceBuilder};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
