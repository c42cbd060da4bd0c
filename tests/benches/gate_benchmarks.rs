//! # Message Gate Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Origin prefix check | < 1µs |
//! | Rate limit check (hot caller) | < 1µs |
//! | Full gate evaluation (HEALTH_CHECK) | < 50µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use message_gate::domain::RateLimitConfig;
use message_gate::{
    message_types, CallerId, GateConfig, GateService, ManualClock, OriginValidator,
    RateLimitState, RequestEnvelope, SenderContext,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Origin validation
// ============================================================================

fn bench_origin_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("origin");

    for prefixes in [1usize, 10, 100] {
        let allowed: Vec<String> = (0..prefixes)
            .map(|i| format!("https://site-{i}.example.com"))
            .collect();
        let validator = match OriginValidator::new(allowed) {
            Ok(v) => v,
            Err(_) => return,
        };
        let last = format!("https://site-{}.example.com/page", prefixes - 1);

        group.bench_with_input(BenchmarkId::new("last_prefix_match", prefixes), &last, |b, origin| {
            b.iter(|| black_box(validator.is_allowed(Some(origin.as_str()))))
        });
        group.bench_with_input(BenchmarkId::new("miss", prefixes), &prefixes, |b, _| {
            b.iter(|| black_box(validator.is_allowed(Some("https://evil.com"))))
        });
    }

    group.finish();
}

// ============================================================================
// Sliding-window limiter
// ============================================================================

fn bench_rate_limit(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limit");
    group.throughput(Throughput::Elements(1));

    let config = RateLimitConfig {
        window: Duration::from_secs(60),
        max_requests: 60,
        max_tracked_callers: 10_000,
        sweep_interval: Duration::from_secs(60),
    };

    // Full window: every check purges nothing and rejects
    let state = RateLimitState::new(&config);
    let caller = CallerId::from("tab-1");
    for t in 0..60 {
        state.try_consume(Some(&caller), t);
    }
    group.bench_function("full_window_reject", |b| {
        b.iter(|| black_box(state.try_consume(Some(&caller), 100)))
    });

    // Sliding: time advances so each check purges one and admits one
    let sliding = RateLimitState::new(&config);
    let mut now = 0u64;
    group.bench_function("sliding_admit", |b| {
        b.iter(|| {
            now += 1_000;
            black_box(sliding.try_consume(Some(&caller), now))
        })
    });

    // Many callers: LRU churn
    let churn = RateLimitState::new(&config);
    let callers: Vec<CallerId> = (0..20_000).map(|i| CallerId::from(format!("tab-{i}"))).collect();
    let mut idx = 0usize;
    group.bench_function("lru_churn", |b| {
        b.iter(|| {
            idx = (idx + 1) % callers.len();
            black_box(churn.try_consume(Some(&callers[idx]), 0))
        })
    });

    group.finish();
}

// ============================================================================
// Full evaluation
// ============================================================================

fn bench_gate_handle(c: &mut Criterion) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    let mut config = GateConfig::default();
    config.origins.allowed = vec!["https://example.com".into()];
    config.rate_limit.max_requests = u32::MAX;
    config.audit.echo_to_tracing = false;

    let service = match GateService::builder(config)
        .clock(Arc::new(ManualClock::new(0)))
        .build()
    {
        Ok(s) => s,
        Err(_) => return,
    };
    let sender = SenderContext::new()
        .with_origin("https://example.com")
        .with_caller("tab-1");

    let mut group = c.benchmark_group("gate");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("health_check", |b| {
        b.iter(|| {
            runtime.block_on(service.handle(
                RequestEnvelope::new(message_types::HEALTH_CHECK),
                sender.clone(),
            ))
        })
    });

    group.bench_function("origin_rejected", |b| {
        let evil = SenderContext::new().with_origin("https://evil.com").with_caller("tab-1");
        b.iter(|| {
            runtime.block_on(service.handle(
                RequestEnvelope::new(message_types::HEALTH_CHECK),
                evil.clone(),
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_origin_check, bench_rate_limit, bench_gate_handle);
criterion_main!(benches);
