//! Consent provider implementations.

use crate::ports::ConsentProvider;
use async_trait::async_trait;
use tracing::debug;

/// Grants every request. Placeholder until the host wires a real prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConsent;

#[async_trait]
impl ConsentProvider for AutoConsent {
    async fn request_consent(&self, action: &str) -> bool {
        debug!(action = action, "Consent granted automatically");
        true
    }
}

/// Always answers with the same decision
#[derive(Debug, Clone, Copy)]
pub struct StaticConsent(pub bool);

#[async_trait]
impl ConsentProvider for StaticConsent {
    async fn request_consent(&self, _action: &str) -> bool {
        self.0
    }
}
