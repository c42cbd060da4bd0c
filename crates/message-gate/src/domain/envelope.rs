//! Inbound request envelope and its sender context.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque caller identifier (tab id, session handle) keying rate-limit state.
///
/// Accepts either a JSON string or an unsigned integer on the wire so that
/// numeric tab ids and string handles key the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CallerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for CallerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for CallerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => CallerId(s),
            Raw::Number(n) => CallerId(n.to_string()),
        })
    }
}

/// Inbound message: `{ "type": string, "data"?: any }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RequestEnvelope {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Ambient sender metadata delivered alongside an envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<CallerId>,
}

impl SenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_caller(mut self, caller_id: impl Into<CallerId>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }
}
