//! Gate checks and cross-cutting concerns.
//!
//! Evaluation order: Origin → RateLimit → Dispatch (guarded by timeout/panic catch).
//! Every evaluation runs inside a request span and updates [`GateMetrics`].

pub mod metrics;
pub mod origin;
pub mod rate_limit;
pub mod timeout;
pub mod tracing;

pub use metrics::{GateMetrics, MetricsSnapshot};
pub use origin::OriginValidator;
pub use rate_limit::{sweep_task, RateLimitState};
pub use timeout::guarded;
