//! Audit log - bounded, append-only record of gate decisions.
//!
//! `record` is synchronous and infallible. Persistence is an explicit,
//! separate step through a [`KeyValueStore`].

use crate::domain::error::StorageError;
use crate::ports::{KeyValueStore, TimeSource};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Action tags written by the gate and the built-in handlers
pub mod actions {
    pub const MESSAGE_BLOCKED: &str = "message_blocked";
    pub const MESSAGE_RECEIVED: &str = "message_received";
    pub const UNKNOWN_MESSAGE_TYPE: &str = "unknown_message_type";
    pub const MESSAGE_HANDLER_ERROR: &str = "message_handler_error";
    pub const AUDIT_LOG_CLEARED: &str = "audit_log_cleared";
    pub const CONSENT_DENIED: &str = "consent_denied";
}

/// Default retained entry count
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// One audit record: `{timestamp, action, details}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601, UTC, millisecond precision
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// Bounded in-memory audit log.
///
/// Once `max_entries` is exceeded the oldest entries are dropped.
pub struct AuditLog {
    entries: Mutex<VecDeque<LogEntry>>,
    max_entries: usize,
    clock: Arc<dyn TimeSource>,
    echo: bool,
}

impl AuditLog {
    pub fn new(max_entries: usize, clock: Arc<dyn TimeSource>) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES))),
            max_entries,
            clock,
            echo: true,
        }
    }

    /// Enable/disable mirroring entries to `tracing` (target `message_gate::audit`)
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append an entry. Non-object `details` are wrapped as `{"value": ...}`.
    pub fn record(&self, action: &str, details: Value) {
        let entry = self.entry(action, details);
        let mut entries = self.entries.lock();
        self.push(&mut entries, entry);
    }

    /// Full current sequence, oldest first
    pub fn read(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Empty the log and record an `audit_log_cleared` marker under one lock
    pub fn clear(&self) {
        let marker = self.entry(actions::AUDIT_LOG_CLEARED, Value::Null);
        let mut entries = self.entries.lock();
        entries.clear();
        self.push(&mut entries, marker);
    }

    fn entry(&self, action: &str, details: Value) -> LogEntry {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        let entry = LogEntry {
            timestamp: iso_timestamp(self.clock.now_ms()),
            action: action.to_string(),
            details,
        };

        if self.echo {
            let details = Value::Object(entry.details.clone());
            debug!(
                target: "message_gate::audit",
                action = %entry.action,
                details = %details,
                "audit"
            );
        }

        entry
    }

    fn push(&self, entries: &mut VecDeque<LogEntry>, entry: LogEntry) {
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Write the current sequence to `store` under `key`
    pub async fn persist(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
        let snapshot = serde_json::to_value(self.read())?;
        store.set(key, snapshot).await
    }

    /// Replace the in-memory sequence with the one stored under `key`.
    ///
    /// Returns the number of entries restored (after truncation to the cap).
    /// A missing key restores nothing and leaves the log untouched.
    pub async fn restore(&self, store: &dyn KeyValueStore, key: &str) -> Result<usize, StorageError> {
        let Some(value) = store.get(key).await? else {
            return Ok(0);
        };

        let stored: Vec<LogEntry> = serde_json::from_value(value)?;
        let skip = stored.len().saturating_sub(self.max_entries);

        let mut entries = self.entries.lock();
        entries.clear();
        entries.extend(stored.into_iter().skip(skip));
        Ok(entries.len())
    }
}

/// Format epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn iso_timestamp(now_ms: u64) -> String {
    let dt = i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ManualClock, MemoryStore};
    use serde_json::json;

    fn log_with_cap(cap: usize) -> AuditLog {
        AuditLog::new(cap, Arc::new(ManualClock::new(1_700_000_000_000))).with_echo(false)
    }

    #[test]
    fn test_iso_timestamp_format() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_record_and_read() {
        let log = log_with_cap(10);
        log.record("message_received", json!({ "type": "HEALTH_CHECK" }));

        let entries = log.read();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "message_received");
        assert_eq!(entries[0].details["type"], "HEALTH_CHECK");
        assert_eq!(entries[0].timestamp, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_non_object_details_are_wrapped() {
        let log = log_with_cap(10);
        log.record("note", json!("hello"));
        log.record("empty", Value::Null);

        let entries = log.read();
        assert_eq!(entries[0].details["value"], "hello");
        assert!(entries[1].details.is_empty());
    }

    #[test]
    fn test_cap_keeps_most_recent() {
        let cap = 100;
        let log = log_with_cap(cap);
        for i in 0..cap + 50 {
            log.record("event", json!({ "seq": i }));
        }

        let entries = log.read();
        assert_eq!(entries.len(), cap);
        assert_eq!(entries.first().unwrap().details["seq"], 50);
        assert_eq!(entries.last().unwrap().details["seq"], cap + 49);
    }

    #[test]
    fn test_clear_leaves_marker() {
        let log = log_with_cap(10);
        log.record("a", Value::Null);
        log.record("b", Value::Null);
        log.clear();

        let entries = log.read();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, actions::AUDIT_LOG_CLEARED);
    }

    #[test]
    fn test_echo_enabled_records() {
        let log = AuditLog::new(10, Arc::new(ManualClock::new(0)));
        log.record("message_received", json!({ "type": "HEALTH_CHECK" }));
        log.clear();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_concurrent_clear_keeps_marker_first() {
        let log = log_with_cap(100_000);

        std::thread::scope(|s| {
            for writer in 0..4 {
                let log = &log;
                s.spawn(move || {
                    for seq in 0..2_000 {
                        log.record("event", json!({ "writer": writer, "seq": seq }));
                    }
                });
            }

            let log = &log;
            s.spawn(move || {
                for _ in 0..200 {
                    log.clear();
                    let entries = log.read();
                    // Nothing may land between emptying and the marker
                    assert_eq!(entries[0].action, actions::AUDIT_LOG_CLEARED);
                    assert_eq!(
                        entries
                            .iter()
                            .filter(|e| e.action == actions::AUDIT_LOG_CLEARED)
                            .count(),
                        1
                    );
                }
            });
        });

        let entries = log.read();
        assert_eq!(entries[0].action, actions::AUDIT_LOG_CLEARED);
    }

    #[test]
    fn test_read_is_idempotent() {
        let log = log_with_cap(10);
        log.record("a", json!({ "k": 1 }));
        assert_eq!(log.read(), log.read());
    }

    #[test]
    fn test_serialized_shape() {
        let log = log_with_cap(10);
        log.record("message_blocked", json!({ "reason": "unauthorized_origin" }));
        let value = serde_json::to_value(log.read()).unwrap();
        assert_eq!(
            value,
            json!([{
                "timestamp": "2023-11-14T22:13:20.000Z",
                "action": "message_blocked",
                "details": { "reason": "unauthorized_origin" }
            }])
        );
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let store = MemoryStore::new();
        let log = log_with_cap(10);
        log.record("a", Value::Null);
        log.record("b", Value::Null);
        log.persist(&store, "audit_log").await.unwrap();

        let restored = log_with_cap(10);
        assert_eq!(restored.restore(&store, "audit_log").await.unwrap(), 2);
        assert_eq!(restored.read(), log.read());
    }

    #[tokio::test]
    async fn test_restore_truncates_to_cap() {
        let store = MemoryStore::new();
        let big = log_with_cap(20);
        for i in 0..20 {
            big.record("event", json!({ "seq": i }));
        }
        big.persist(&store, "audit_log").await.unwrap();

        let small = log_with_cap(5);
        assert_eq!(small.restore(&store, "audit_log").await.unwrap(), 5);
        assert_eq!(small.read()[0].details["seq"], 15);
    }

    #[tokio::test]
    async fn test_restore_missing_key_keeps_log() {
        let store = MemoryStore::new();
        let log = log_with_cap(5);
        log.record("a", Value::Null);
        assert_eq!(log.restore(&store, "audit_log").await.unwrap(), 0);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_corrupt_value() {
        let store = MemoryStore::new();
        store.set("audit_log", json!({ "not": "a list" })).await.unwrap();
        let log = log_with_cap(5);
        let err = log.restore(&store, "audit_log").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
