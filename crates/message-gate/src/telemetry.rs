//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level. JSON output is meant for
//! log shippers, pretty output for development.

use crate::domain::config::TelemetryConfig;
use crate::domain::error::GateError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// # Errors
///
/// [`GateError::Telemetry`] if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), GateError> {
    let env_filter = build_filter(config)?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| GateError::Telemetry(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| GateError::Telemetry(e.to_string()))?;
    }

    tracing::info!(
        level = %config.log_level,
        json = config.json_logs,
        "Tracing initialized"
    );
    Ok(())
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, GateError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| GateError::Telemetry(e.to_string()))
}
