//! Gate decision counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Message Gate metrics
#[derive(Debug, Default)]
pub struct GateMetrics {
    pub requests_total: AtomicU64,

    // Rejections (silent drops)
    pub rejected_origin: AtomicU64,
    pub rejected_rate: AtomicU64,

    // Dispatch outcomes
    pub dispatched: AtomicU64,
    pub unknown_type: AtomicU64,
    pub handler_errors: AtomicU64,
    pub responded: AtomicU64,
}

/// Point-in-time copy of [`GateMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_origin: u64,
    pub rejected_rate: u64,
    pub dispatched: u64,
    pub unknown_type: u64,
    pub handler_errors: u64,
    pub responded: u64,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_origin_rejection(&self) {
        self.rejected_origin.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_rejection(&self) {
        self.rejected_rate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_type(&self) {
        self.unknown_type.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response(&self) {
        self.responded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            rejected_origin: self.rejected_origin.load(Ordering::Relaxed),
            rejected_rate: self.rejected_rate.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unknown_type: self.unknown_type.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            responded: self.responded.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus text format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let counters = [
            ("requests_total", "Inbound messages seen by the gate", s.requests_total),
            ("rejected_origin_total", "Messages dropped for origin", s.rejected_origin),
            ("rejected_rate_total", "Messages dropped by rate limit", s.rejected_rate),
            ("dispatched_total", "Messages dispatched to the registry", s.dispatched),
            ("unknown_type_total", "Messages with an unregistered type", s.unknown_type),
            ("handler_errors_total", "Handler faults", s.handler_errors),
            ("responded_total", "Messages answered", s.responded),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP message_gate_{name} {help}\n\
                 # TYPE message_gate_{name} counter\n\
                 message_gate_{name} {value}\n"
            ));
        }
        output
    }
}
