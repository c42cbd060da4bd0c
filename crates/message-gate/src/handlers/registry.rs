//! Static message-type → handler registry.
//!
//! Built once through [`RegistryBuilder`]; bad or duplicate tags fail at
//! construction. The built registry is read-only.

use crate::domain::correlation::RequestId;
use crate::domain::envelope::SenderContext;
use crate::domain::error::{GateError, GateResult, HandlerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-request metadata handed to handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub message_type: String,
    pub sender: SenderContext,
}

/// Handler for one message type
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        payload: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, HandlerError>;
}

/// Closed set of routable message types
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<String, Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Exact-match lookup
    pub fn get(&self, message_type: &str) -> Option<&Arc<dyn MessageHandler>> {
        self.handlers.get(message_type)
    }

    pub fn contains(&self, message_type: &str) -> bool {
        self.handlers.contains_key(message_type)
    }

    /// Registered tags, sorted
    pub fn message_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("message_types", &self.message_types())
            .finish()
    }
}

/// Builder validating tags as they are registered
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl RegistryBuilder {
    /// Register `handler` under `message_type`.
    ///
    /// # Errors
    ///
    /// - [`GateError::InvalidMessageType`] if the tag is empty or not
    ///   `UPPER_SNAKE_CASE` (ASCII uppercase, digits, `_`)
    /// - [`GateError::DuplicateHandler`] if the tag is already registered
    pub fn register<H>(self, message_type: impl Into<String>, handler: H) -> GateResult<Self>
    where
        H: MessageHandler + 'static,
    {
        self.register_arc(message_type, Arc::new(handler))
    }

    pub fn register_arc(
        mut self,
        message_type: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> GateResult<Self> {
        let message_type = message_type.into();
        if !is_valid_tag(&message_type) {
            return Err(GateError::InvalidMessageType(message_type));
        }
        if self.handlers.contains_key(&message_type) {
            return Err(GateError::DuplicateHandler(message_type));
        }
        self.handlers.insert(message_type, handler);
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}
