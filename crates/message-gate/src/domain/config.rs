//! Gate configuration with validation.
//!
//! Loaded from TOML, then optionally layered with `GATE_*` environment
//! variables. Durations use human-readable form (`"60s"`, `"5m"`).

use crate::domain::audit::DEFAULT_MAX_ENTRIES;
use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Allowed origin prefixes
    pub origins: OriginConfig,
    /// Sliding-window rate limiting
    pub rate_limit: RateLimitConfig,
    /// Audit log retention and persistence
    pub audit: AuditConfig,
    /// Handler dispatch behaviour
    pub dispatch: DispatchConfig,
    /// Log output
    pub telemetry: TelemetryConfig,
}

impl GateConfig {
    /// Load configuration from a TOML file.
    ///
    /// ```toml
    /// [origins]
    /// allowed = ["https://example.com", "chrome-extension://abcdef"]
    ///
    /// [rate_limit]
    /// window = "60s"
    /// max_requests = 60
    ///
    /// [audit]
    /// max_entries = 1000
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: GateConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GATE_*` overrides from the process environment.
    ///
    /// - `GATE_ALLOWED_ORIGINS`: comma-separated prefixes (replaces the list)
    /// - `GATE_RATE_LIMIT_MAX`: max requests per window
    /// - `GATE_RATE_LIMIT_WINDOW`: window length, e.g. `30s`
    /// - `GATE_AUDIT_MAX_ENTRIES`: retained audit entries
    /// - `GATE_LOG_LEVEL`: tracing filter directive
    /// - `GATE_JSON_LOGS`: `true`/`1` for JSON output
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, then re-validate
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origins) = lookup("GATE_ALLOWED_ORIGINS") {
            self.origins.allowed = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(max) = lookup("GATE_RATE_LIMIT_MAX") {
            self.rate_limit.max_requests = max.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("GATE_RATE_LIMIT_MAX is not a number: {max:?}"))
            })?;
        }

        if let Some(window) = lookup("GATE_RATE_LIMIT_WINDOW") {
            self.rate_limit.window = humantime::parse_duration(window.trim()).map_err(|e| {
                ConfigError::Invalid(format!("GATE_RATE_LIMIT_WINDOW {window:?}: {e}"))
            })?;
        }

        if let Some(max) = lookup("GATE_AUDIT_MAX_ENTRIES") {
            self.audit.max_entries = max.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("GATE_AUDIT_MAX_ENTRIES is not a number: {max:?}"))
            })?;
        }

        if let Some(level) = lookup("GATE_LOG_LEVEL") {
            self.telemetry.log_level = level;
        }

        if let Some(json) = lookup("GATE_JSON_LOGS") {
            self.telemetry.json_logs = json.eq_ignore_ascii_case("true") || json == "1";
        }

        self.validate()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(idx) = self.origins.allowed.iter().position(|o| o.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "origins.allowed[{idx}] is empty and would match every origin"
            )));
        }

        if self.rate_limit.window.is_zero() {
            return Err(ConfigError::Invalid("rate_limit.window cannot be 0".into()));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests cannot be 0".into(),
            ));
        }

        if self.rate_limit.max_tracked_callers == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_tracked_callers cannot be 0".into(),
            ));
        }

        if self.rate_limit.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "rate_limit.sweep_interval cannot be 0".into(),
            ));
        }

        if self.audit.max_entries == 0 {
            return Err(ConfigError::Invalid("audit.max_entries cannot be 0".into()));
        }

        if self.audit.persist_key.is_empty() {
            return Err(ConfigError::Invalid("audit.persist_key cannot be empty".into()));
        }

        if matches!(self.audit.flush_interval, Some(d) if d.is_zero()) {
            return Err(ConfigError::Invalid("audit.flush_interval cannot be 0".into()));
        }

        if matches!(self.dispatch.handler_timeout, Some(d) if d.is_zero()) {
            return Err(ConfigError::Invalid(
                "dispatch.handler_timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Allowed origin prefixes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Prefixes matched with `starts_with`. Empty list rejects everything.
    pub allowed: Vec<String>,
}

/// Sliding-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Trailing window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Requests allowed per caller within the window
    pub max_requests: u32,
    /// Bound on distinct callers tracked (LRU eviction beyond it)
    pub max_tracked_callers: usize,
    /// How often empty caller windows are swept
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 60,
            max_tracked_callers: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Retained entry cap
    pub max_entries: usize,
    /// Mirror entries to tracing at debug level
    pub echo_to_tracing: bool,
    /// Storage key used for persist/restore
    pub persist_key: String,
    /// Periodic flush to the store (None = only on clear and shutdown)
    #[serde(with = "humantime_serde")]
    pub flush_interval: Option<Duration>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            echo_to_tracing: true,
            persist_key: "audit_log".to_string(),
            flush_interval: None,
        }
    }
}

/// Dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Abandon handlers running longer than this (None = run to completion)
    #[serde(with = "humantime_serde")]
    pub handler_timeout: Option<Duration>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// JSON formatted output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
