//! Request spans for structured logging.

use crate::domain::correlation::RequestId;
use crate::domain::envelope::{RequestEnvelope, SenderContext};
use tracing::{info_span, Span};

/// Create the span wrapping one gate evaluation.
///
/// `gate.outcome` is left empty and recorded by the gate when it settles.
pub fn request_span(request_id: &RequestId, envelope: &RequestEnvelope, sender: &SenderContext) -> Span {
    info_span!(
        "gate_request",
        request.id = %request_id,
        message_type = %envelope.message_type,
        origin = sender.origin.as_deref().unwrap_or("-"),
        caller = %sender.caller_id.as_ref().map(|c| c.as_str()).unwrap_or("-"),
        gate.outcome = tracing::field::Empty,
    )
}

/// Record the terminal outcome on the current span
pub fn record_outcome(outcome: &'static str) {
    Span::current().record("gate.outcome", outcome);
}
