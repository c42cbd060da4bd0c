//! Built-in handlers: health probe and audit log retrieval/clearing.

use super::registry::{MessageHandler, RequestContext};
use crate::domain::audit::{actions, AuditLog};
use crate::domain::error::HandlerError;
use crate::ports::{ConsentProvider, KeyValueStore, TimeSource};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Recognized message types
pub mod message_types {
    pub const HEALTH_CHECK: &str = "HEALTH_CHECK";
    pub const GET_AUDIT_LOG: &str = "GET_AUDIT_LOG";
    pub const CLEAR_AUDIT_LOG: &str = "CLEAR_AUDIT_LOG";
}

/// Consent action requested before clearing the audit log
pub const CLEAR_AUDIT_LOG_ACTION: &str = "clear_audit_log";

/// `HEALTH_CHECK` → `{"status": "healthy", "timestamp": <ms>}`
pub struct HealthCheckHandler {
    clock: Arc<dyn TimeSource>,
}

impl HealthCheckHandler {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl MessageHandler for HealthCheckHandler {
    async fn handle(&self, _ctx: &RequestContext, _payload: Option<Value>) -> Result<Value, HandlerError> {
        Ok(json!({
            "status": "healthy",
            "timestamp": self.clock.now_ms(),
        }))
    }
}

/// `GET_AUDIT_LOG` → the full current log as a JSON array
pub struct GetAuditLogHandler {
    audit: Arc<AuditLog>,
}

impl GetAuditLogHandler {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl MessageHandler for GetAuditLogHandler {
    async fn handle(&self, _ctx: &RequestContext, _payload: Option<Value>) -> Result<Value, HandlerError> {
        Ok(serde_json::to_value(self.audit.read())?)
    }
}

/// `CLEAR_AUDIT_LOG` → `{"success": bool}`
///
/// Asks the consent provider first. When a store is attached the cleared log
/// is persisted; a storage failure is a handler fault.
pub struct ClearAuditLogHandler {
    audit: Arc<AuditLog>,
    consent: Arc<dyn ConsentProvider>,
    store: Option<(Arc<dyn KeyValueStore>, String)>,
}

impl ClearAuditLogHandler {
    pub fn new(audit: Arc<AuditLog>, consent: Arc<dyn ConsentProvider>) -> Self {
        Self {
            audit,
            consent,
            store: None,
        }
    }

    /// Persist the cleared log to `store` under `key`
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        self.store = Some((store, key.into()));
        self
    }
}

#[async_trait]
impl MessageHandler for ClearAuditLogHandler {
    async fn handle(&self, ctx: &RequestContext, _payload: Option<Value>) -> Result<Value, HandlerError> {
        if !self.consent.request_consent(CLEAR_AUDIT_LOG_ACTION).await {
            self.audit.record(
                actions::CONSENT_DENIED,
                json!({ "action": CLEAR_AUDIT_LOG_ACTION }),
            );
            return Ok(json!({ "success": false }));
        }

        self.audit.clear();
        info!(request_id = %ctx.request_id, "Audit log cleared");

        if let Some((store, key)) = &self.store {
            self.audit.persist(store.as_ref(), key).await?;
        }

        Ok(json!({ "success": true }))
    }
}
