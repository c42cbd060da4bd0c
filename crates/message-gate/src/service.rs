//! Gate service - wires config, adapters and the gate, and owns background tasks.

use crate::adapters::{AutoConsent, SystemTimeSource};
use crate::domain::audit::AuditLog;
use crate::domain::config::GateConfig;
use crate::domain::envelope::{RequestEnvelope, SenderContext};
use crate::domain::error::GateResult;
use crate::gate::{Disposition, MessageGate};
use crate::handlers::{BuiltinDeps, HandlerRegistry, MessageHandler};
use crate::middleware::{sweep_task, GateMetrics, OriginValidator, RateLimitState};
use crate::ports::{ConsentProvider, KeyValueStore, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Message Gate service
pub struct GateService {
    config: GateConfig,
    gate: Arc<MessageGate>,
    clock: Arc<dyn TimeSource>,
    store: Option<Arc<dyn KeyValueStore>>,
    tasks: Vec<JoinHandle<()>>,
}

impl GateService {
    pub fn builder(config: GateConfig) -> GateServiceBuilder {
        GateServiceBuilder::new(config)
    }

    /// Restore the audit log and spawn background tasks.
    ///
    /// Must run inside a tokio runtime. Calling it again is a no-op.
    pub async fn start(&mut self) -> GateResult<()> {
        if !self.tasks.is_empty() {
            warn!("Gate service already started");
            return Ok(());
        }

        info!("Starting Message Gate...");

        if let Some(store) = &self.store {
            let restored = self
                .gate
                .audit()
                .restore(store.as_ref(), &self.config.audit.persist_key)
                .await?;
            info!(entries = restored, "Audit log restored");
        }

        self.tasks.push(tokio::spawn(sweep_task(
            Arc::clone(self.gate.limiter()),
            Arc::clone(&self.clock),
            self.config.rate_limit.sweep_interval,
        )));

        if let (Some(store), Some(interval)) = (&self.store, self.config.audit.flush_interval) {
            self.tasks.push(tokio::spawn(flush_task(
                Arc::clone(self.gate.audit()),
                Arc::clone(store),
                self.config.audit.persist_key.clone(),
                interval,
            )));
        }

        info!(
            origins = self.config.origins.allowed.len(),
            max_requests = self.config.rate_limit.max_requests,
            window_ms = self.config.rate_limit.window_ms(),
            "Message Gate started"
        );
        Ok(())
    }

    /// Stop background tasks and flush the audit log.
    ///
    /// Rate windows live only in memory and are dropped.
    pub async fn shutdown(&mut self) -> GateResult<()> {
        for task in self.tasks.drain(..) {
            task.abort();
        }

        if let Some(store) = &self.store {
            self.gate
                .audit()
                .persist(store.as_ref(), &self.config.audit.persist_key)
                .await?;
        }

        info!("Message Gate stopped");
        Ok(())
    }

    /// Evaluate one inbound message
    pub async fn handle(&self, envelope: RequestEnvelope, sender: SenderContext) -> Disposition {
        self.gate.handle(envelope, sender).await
    }

    pub fn gate(&self) -> Arc<MessageGate> {
        Arc::clone(&self.gate)
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        Arc::clone(self.gate.audit())
    }

    pub fn metrics(&self) -> Arc<GateMetrics> {
        Arc::clone(self.gate.metrics())
    }

    pub fn rate_limit_state(&self) -> Arc<RateLimitState> {
        Arc::clone(self.gate.limiter())
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }
}

impl Drop for GateService {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Builder for [`GateService`]
pub struct GateServiceBuilder {
    config: GateConfig,
    clock: Option<Arc<dyn TimeSource>>,
    store: Option<Arc<dyn KeyValueStore>>,
    consent: Option<Arc<dyn ConsentProvider>>,
    handlers: Vec<(String, Arc<dyn MessageHandler>)>,
}

impl GateServiceBuilder {
    fn new(config: GateConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
            consent: None,
            handlers: Vec::new(),
        }
    }

    /// Defaults to [`SystemTimeSource`]
    pub fn clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Persist the audit log here
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`AutoConsent`]
    pub fn consent(mut self, consent: Arc<dyn ConsentProvider>) -> Self {
        self.consent = Some(consent);
        self
    }

    /// Register an extra handler next to the built-ins
    pub fn handler<H>(mut self, message_type: impl Into<String>, handler: H) -> Self
    where
        H: MessageHandler + 'static,
    {
        self.handlers.push((message_type.into(), Arc::new(handler)));
        self
    }

    /// Validate config and handler tags, then assemble the gate.
    pub fn build(self) -> GateResult<GateService> {
        let config = self.config;
        config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemTimeSource) as Arc<dyn TimeSource>);
        let consent = self
            .consent
            .unwrap_or_else(|| Arc::new(AutoConsent) as Arc<dyn ConsentProvider>);

        let audit = Arc::new(
            AuditLog::new(config.audit.max_entries, Arc::clone(&clock))
                .with_echo(config.audit.echo_to_tracing),
        );

        let deps = BuiltinDeps {
            audit: Arc::clone(&audit),
            clock: Arc::clone(&clock),
            consent,
            store: self
                .store
                .as_ref()
                .map(|store| (Arc::clone(store), config.audit.persist_key.clone())),
        };

        let registry = self
            .handlers
            .into_iter()
            .try_fold(HandlerRegistry::builder().with_builtins(deps)?, |builder, (tag, h)| {
                builder.register_arc(tag, h)
            })?
            .build();

        let gate = MessageGate::new(
            OriginValidator::from_config(&config.origins)?,
            Arc::new(RateLimitState::new(&config.rate_limit)),
            registry,
            audit,
            Arc::clone(&clock),
        )
        .with_handler_timeout(config.dispatch.handler_timeout);

        Ok(GateService {
            config,
            gate: Arc::new(gate),
            clock,
            store: self.store,
            tasks: Vec::new(),
        })
    }
}

/// Periodically write the audit log to `store`
async fn flush_task(
    audit: Arc<AuditLog>,
    store: Arc<dyn KeyValueStore>,
    key: String,
    interval: Duration,
) {
    let mut flush_interval = tokio::time::interval(interval);
    flush_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick completes immediately
    flush_interval.tick().await;

    loop {
        flush_interval.tick().await;
        if let Err(e) = audit.persist(store.as_ref(), &key).await {
            warn!(error = %e, "Audit log flush failed");
        }
    }
}
