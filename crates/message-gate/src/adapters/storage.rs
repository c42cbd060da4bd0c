//! Key-value store adapters.

use crate::domain::error::StorageError;
use crate::ports::KeyValueStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every `set`/`remove` rewrites the whole file through a temporary sibling
/// and a rename. Writers are serialized by an async mutex.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the store file with `.tmp` appended to the full name
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_object(&self) -> Result<Map<String, Value>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        if bytes.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Corrupt(format!(
                "expected JSON object in {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn write_object(&self, map: Map<String, Value>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&Value::Object(map))?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Wrote key-value store");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut map = self.read_object().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_object().await?;
        map.insert(key.to_string(), value);
        self.write_object(map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_object().await?;
        if map.remove(key).is_some() {
            self.write_object(map).await?;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
