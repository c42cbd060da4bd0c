//! # Concurrency
//!
//! Parallel requests for one caller must never exceed the window limit,
//! however they interleave.

use super::{config, service, tab};
use futures::future::join_all;
use message_gate::{
    actions, message_types, CallerId, RateLimitState, RejectReason, RequestEnvelope,
};
use message_gate::domain::RateLimitConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// GATE UNDER PARALLEL LOAD
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_same_caller_admits_exactly_limit() {
    let (gate, _) = service(config());

    let tasks = (0..1000).map(|_| {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            gate.handle(RequestEnvelope::new(message_types::HEALTH_CHECK), tab("tab-1"))
                .await
        })
    });

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let admitted = outcomes.iter().filter(|o| !o.is_rejected()).count();
    assert_eq!(admitted, 60);
    assert_eq!(
        gate.rate_limit_state().window_len(&CallerId::from("tab-1")),
        60
    );

    let blocked = gate
        .audit()
        .read()
        .into_iter()
        .filter(|e| e.action == actions::MESSAGE_BLOCKED)
        .count();
    assert_eq!(blocked, 940);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_callers_are_independent() {
    let mut cfg = config();
    cfg.audit.max_entries = 10_000;
    let (gate, _) = service(cfg);

    let tasks = (0..20).flat_map(|caller| {
        let gate = Arc::clone(&gate);
        (0..70).map(move |_| {
            let gate = Arc::clone(&gate);
            let id = format!("tab-{caller}");
            tokio::spawn(async move {
                let out = gate
                    .handle(RequestEnvelope::new(message_types::HEALTH_CHECK), tab(&id))
                    .await;
                (id, out.is_rejected())
            })
        })
    });

    let mut admitted = std::collections::HashMap::new();
    for result in join_all(tasks).await {
        let (id, rejected) = result.unwrap();
        if !rejected {
            *admitted.entry(id).or_insert(0usize) += 1;
        }
    }

    assert_eq!(admitted.len(), 20);
    assert!(admitted.values().all(|&n| n == 60));
    assert_eq!(gate.metrics().snapshot().rejected_rate, 20 * 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_rejections_keep_reason() {
    let mut cfg = config();
    cfg.rate_limit.max_requests = 1;
    let (gate, _) = service(cfg);

    let tasks = (0..50).map(|_| {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            gate.handle(RequestEnvelope::new(message_types::HEALTH_CHECK), tab("tab-1"))
                .await
        })
    });

    let rejected: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|o| o.is_rejected())
        .collect();

    assert_eq!(rejected.len(), 49);
    assert!(rejected
        .iter()
        .all(|o| *o == message_gate::Disposition::Rejected(RejectReason::RateLimitExceeded)));
}

// =============================================================================
// LIMITER FROM OS THREADS
// =============================================================================

#[test]
fn test_limiter_threads_share_one_window() {
    let state = RateLimitState::new(&RateLimitConfig {
        window: Duration::from_secs(60),
        max_requests: 60,
        max_tracked_callers: 16,
        sweep_interval: Duration::from_secs(60),
    });
    let caller = CallerId::from("tab-1");
    let accepted_at = Mutex::new(Vec::new());

    std::thread::scope(|s| {
        for thread in 0..8u64 {
            let state = &state;
            let caller = &caller;
            let accepted_at = &accepted_at;
            s.spawn(move || {
                for i in 0..125u64 {
                    let now = thread * 125 + i;
                    if state.try_consume(Some(caller), now) {
                        accepted_at.lock().push(now);
                    }
                }
            });
        }
    });

    assert_eq!(accepted_at.lock().len(), 60);
    assert_eq!(state.window_len(&caller), 60);
}
