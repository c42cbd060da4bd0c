//! # Resource Bounds
//!
//! Floods of distinct callers or log writes must not grow memory without
//! limit.

use super::{config, service, tab};
use message_gate::{message_types, CallerId, RequestEnvelope, TimeSource};

#[tokio::test]
async fn test_distinct_caller_flood_is_bounded() {
    let mut cfg = config();
    cfg.rate_limit.max_tracked_callers = 1_000;
    let (gate, _) = service(cfg);

    for i in 0..20_000 {
        let out = gate
            .handle(RequestEnvelope::new(message_types::HEALTH_CHECK), tab(&format!("tab-{i}")))
            .await;
        assert!(!out.is_rejected());
    }

    let limiter = gate.rate_limit_state();
    assert_eq!(limiter.tracked_callers(), 1_000);
    // Oldest callers were evicted, newest are still tracked
    assert_eq!(limiter.window_len(&CallerId::from("tab-0")), 0);
    assert_eq!(limiter.window_len(&CallerId::from("tab-19999")), 1);
    assert_eq!(gate.audit().len(), 1_000);
}

#[tokio::test]
async fn test_sweep_drops_idle_callers() {
    let (gate, clock) = service(config());

    for i in 0..500 {
        gate.handle(RequestEnvelope::new(message_types::HEALTH_CHECK), tab(&format!("tab-{i}")))
            .await;
    }
    let limiter = gate.rate_limit_state();
    assert_eq!(limiter.tracked_callers(), 500);

    clock.advance(30_000);
    assert_eq!(limiter.sweep(clock.now_ms()), 0);

    clock.advance(30_000);
    assert_eq!(limiter.sweep(clock.now_ms()), 500);
    assert_eq!(limiter.tracked_callers(), 0);
}

#[tokio::test]
async fn test_audit_flood_keeps_newest() {
    let mut cfg = config();
    cfg.audit.max_entries = 100;
    let (gate, _) = service(cfg);

    let audit = gate.audit();
    for i in 0..150 {
        audit.record("flood", serde_json::json!({ "n": i }));
    }

    let entries = audit.read();
    assert_eq!(entries.len(), 100);
    assert_eq!(entries[0].details["n"], 50);
    assert_eq!(entries[99].details["n"], 149);
}
