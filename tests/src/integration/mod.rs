//! # Integration Suites

mod concurrency;
mod resource_bounds;

use message_gate::{GateConfig, GateService, ManualClock, SenderContext};
use std::sync::Arc;

pub(crate) const ORIGIN: &str = "https://example.com";

pub(crate) fn config() -> GateConfig {
    let mut config = GateConfig::default();
    config.origins.allowed = vec![ORIGIN.to_string()];
    config.audit.echo_to_tracing = false;
    config
}

pub(crate) fn service(config: GateConfig) -> (Arc<GateService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let service = GateService::builder(config)
        .clock(clock.clone())
        .build()
        .unwrap();
    (Arc::new(service), clock)
}

pub(crate) fn tab(id: &str) -> SenderContext {
    SenderContext::new().with_origin(ORIGIN).with_caller(id)
}
