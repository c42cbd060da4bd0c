//! Message handlers and the dispatch registry.

pub mod builtin;
pub mod registry;

pub use builtin::{
    message_types, ClearAuditLogHandler, GetAuditLogHandler, HealthCheckHandler,
    CLEAR_AUDIT_LOG_ACTION,
};
pub use registry::{HandlerRegistry, MessageHandler, RegistryBuilder, RequestContext};

use crate::domain::audit::AuditLog;
use crate::domain::error::GateResult;
use crate::ports::{ConsentProvider, KeyValueStore, TimeSource};
use std::sync::Arc;

/// Dependencies of the built-in handlers
#[derive(Clone)]
pub struct BuiltinDeps {
    pub audit: Arc<AuditLog>,
    pub clock: Arc<dyn TimeSource>,
    pub consent: Arc<dyn ConsentProvider>,
    /// Store and key the cleared audit log is persisted to
    pub store: Option<(Arc<dyn KeyValueStore>, String)>,
}

impl RegistryBuilder {
    /// Register `HEALTH_CHECK`, `GET_AUDIT_LOG` and `CLEAR_AUDIT_LOG`
    pub fn with_builtins(self, deps: BuiltinDeps) -> GateResult<Self> {
        let mut clear = ClearAuditLogHandler::new(Arc::clone(&deps.audit), deps.consent);
        if let Some((store, key)) = deps.store {
            clear = clear.with_store(store, key);
        }

        self.register(message_types::HEALTH_CHECK, HealthCheckHandler::new(deps.clock))?
            .register(message_types::GET_AUDIT_LOG, GetAuditLogHandler::new(deps.audit))?
            .register(message_types::CLEAR_AUDIT_LOG, clear)
    }
}

impl HandlerRegistry {
    /// Registry holding only the built-in handlers
    pub fn standard(deps: BuiltinDeps) -> GateResult<Self> {
        Ok(Self::builder().with_builtins(deps)?.build())
    }
}
