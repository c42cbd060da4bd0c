//! Message Gate - authorizes, dispatches and answers inbound messages.
//!
//! ```text
//! RECEIVED → ORIGIN_CHECKED → RATE_CHECKED → DISPATCHED → RESPONDED | ERRORED
//!                 │                 │
//!                 └──── REJECTED ───┘   (no response, logged)
//! ```
//!
//! Every request is evaluated exactly once. Rejections never produce a
//! response, so callers cannot tell "denied" from "lost".

use crate::domain::audit::{actions, AuditLog};
use crate::domain::correlation::RequestId;
use crate::domain::envelope::{RequestEnvelope, SenderContext};
use crate::domain::error::ErrorBody;
use crate::handlers::{HandlerRegistry, RequestContext};
use crate::middleware::tracing::{record_outcome, request_span};
use crate::middleware::{guarded, GateMetrics, OriginValidator, RateLimitState};
use crate::ports::TimeSource;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn, Instrument};

/// Evaluation stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateStage {
    Received,
    OriginChecked,
    RateChecked,
    Dispatched,
    Responded,
    Errored,
    Rejected,
}

impl GateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStage::Received => "received",
            GateStage::OriginChecked => "origin_checked",
            GateStage::RateChecked => "rate_checked",
            GateStage::Dispatched => "dispatched",
            GateStage::Responded => "responded",
            GateStage::Errored => "errored",
            GateStage::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GateStage::Responded | GateStage::Errored | GateStage::Rejected
        )
    }
}

/// Why a request was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    UnauthorizedOrigin,
    RateLimitExceeded,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::UnauthorizedOrigin => "unauthorized_origin",
            RejectReason::RateLimitExceeded => "rate_limit_exceeded",
        }
    }
}

/// Terminal outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Handler result, or the soft error for an unknown type
    Responded(Value),
    /// Handler fault, answered with the generic error body
    Errored(Value),
    /// Silently dropped; the caller gets nothing
    Rejected(RejectReason),
}

impl Disposition {
    pub fn stage(&self) -> GateStage {
        match self {
            Disposition::Responded(_) => GateStage::Responded,
            Disposition::Errored(_) => GateStage::Errored,
            Disposition::Rejected(_) => GateStage::Rejected,
        }
    }

    /// Body to send back, if any
    pub fn response(&self) -> Option<&Value> {
        match self {
            Disposition::Responded(body) | Disposition::Errored(body) => Some(body),
            Disposition::Rejected(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Value> {
        match self {
            Disposition::Responded(body) | Disposition::Errored(body) => Some(body),
            Disposition::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Disposition::Rejected(_))
    }
}

/// The Message Gate
pub struct MessageGate {
    origins: OriginValidator,
    limiter: Arc<RateLimitState>,
    registry: HandlerRegistry,
    audit: Arc<AuditLog>,
    clock: Arc<dyn TimeSource>,
    metrics: Arc<GateMetrics>,
    handler_timeout: Option<Duration>,
}

impl MessageGate {
    pub fn new(
        origins: OriginValidator,
        limiter: Arc<RateLimitState>,
        registry: HandlerRegistry,
        audit: Arc<AuditLog>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            origins,
            limiter,
            registry,
            audit,
            clock,
            metrics: Arc::new(GateMetrics::new()),
            handler_timeout: None,
        }
    }

    /// Abandon handlers running longer than `limit`
    pub fn with_handler_timeout(mut self, limit: Option<Duration>) -> Self {
        self.handler_timeout = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Evaluate one inbound message
    pub async fn handle(&self, envelope: RequestEnvelope, sender: SenderContext) -> Disposition {
        let request_id = RequestId::new();
        let span = request_span(&request_id, &envelope, &sender);

        async move {
            let disposition = self.evaluate(request_id, envelope, sender).await;
            record_outcome(disposition.stage().as_str());
            disposition
        }
        .instrument(span)
        .await
    }

    async fn evaluate(
        &self,
        request_id: RequestId,
        envelope: RequestEnvelope,
        sender: SenderContext,
    ) -> Disposition {
        self.metrics.record_request();
        debug!(stage = GateStage::Received.as_str(), "Message received");

        if !self.origins.is_allowed(sender.origin.as_deref()) {
            warn!(origin = ?sender.origin, "Blocked message from unauthorized origin");
            self.metrics.record_origin_rejection();
            self.audit.record(
                actions::MESSAGE_BLOCKED,
                json!({
                    "reason": RejectReason::UnauthorizedOrigin.as_str(),
                    "origin": sender.origin,
                }),
            );
            return Disposition::Rejected(RejectReason::UnauthorizedOrigin);
        }
        debug!(stage = GateStage::OriginChecked.as_str(), "Origin allowed");

        let now_ms = self.clock.now_ms();
        if !self.limiter.try_consume(sender.caller_id.as_ref(), now_ms) {
            warn!(caller = ?sender.caller_id, "Blocked message over rate limit");
            self.metrics.record_rate_rejection();
            self.audit.record(
                actions::MESSAGE_BLOCKED,
                json!({
                    "reason": RejectReason::RateLimitExceeded.as_str(),
                    "callerId": sender.caller_id,
                }),
            );
            return Disposition::Rejected(RejectReason::RateLimitExceeded);
        }
        debug!(stage = GateStage::RateChecked.as_str(), "Rate limit passed");

        self.metrics.record_dispatch();
        self.audit.record(
            actions::MESSAGE_RECEIVED,
            json!({
                "type": envelope.message_type,
                "origin": sender.origin,
                "callerId": sender.caller_id,
            }),
        );
        debug!(stage = GateStage::Dispatched.as_str(), "Dispatching");

        let Some(handler) = self.registry.get(&envelope.message_type) else {
            self.metrics.record_unknown_type();
            self.metrics.record_response();
            self.audit.record(
                actions::UNKNOWN_MESSAGE_TYPE,
                json!({ "type": envelope.message_type }),
            );
            return Disposition::Responded(ErrorBody::unknown_message_type().into_value());
        };

        let ctx = RequestContext {
            request_id,
            message_type: envelope.message_type,
            sender,
        };

        match guarded(handler.handle(&ctx, envelope.data), self.handler_timeout).await {
            Ok(body) => {
                self.metrics.record_response();
                Disposition::Responded(body)
            }
            Err(e) => {
                warn!(error = %e, "Message handler failed");
                self.metrics.record_handler_error();
                self.audit.record(
                    actions::MESSAGE_HANDLER_ERROR,
                    json!({
                        "type": ctx.message_type,
                        "error": e.to_string(),
                    }),
                );
                Disposition::Errored(ErrorBody::internal().into_value())
            }
        }
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn limiter(&self) -> &Arc<RateLimitState> {
        &self.limiter
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<GateMetrics> {
        &self.metrics
    }
}
