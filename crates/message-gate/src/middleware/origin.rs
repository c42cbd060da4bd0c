//! Origin validation.
//!
//! Prefix match against a fixed allow-set. An absent or empty origin is never
//! allowed.

use crate::domain::config::OriginConfig;
use crate::domain::error::ConfigError;

/// Immutable allowed-origin prefix set
#[derive(Debug, Clone)]
pub struct OriginValidator {
    allowed: Box<[String]>,
}

impl OriginValidator {
    /// Build from prefixes. Empty prefixes are rejected: they would match everything.
    pub fn new<I, S>(allowed: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
        if allowed.iter().any(|o| o.is_empty()) {
            return Err(ConfigError::Invalid(
                "empty origin prefix would match every origin".into(),
            ));
        }
        Ok(Self {
            allowed: allowed.into_boxed_slice(),
        })
    }

    pub fn from_config(config: &OriginConfig) -> Result<Self, ConfigError> {
        Self::new(config.allowed.iter().cloned())
    }

    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(origin) if !origin.is_empty() => {
                self.allowed.iter().any(|prefix| origin.starts_with(prefix.as_str()))
            }
            _ => false,
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.allowed
    }
}
