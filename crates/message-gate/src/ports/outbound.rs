//! Outbound ports for the Message Gate.

use crate::domain::error::StorageError;
use async_trait::async_trait;

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;
}

/// Local key-value storage (extension `storage.local` or equivalent).
///
/// Values are JSON documents. Implementations decide durability.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// User consent capability for privileged actions.
///
/// Returns whether the user agreed to `action`. How consent is obtained
/// (prompt, policy, allow-list) is up to the integrator.
#[async_trait]
pub trait ConsentProvider: Send + Sync {
    async fn request_consent(&self, action: &str) -> bool;
}
