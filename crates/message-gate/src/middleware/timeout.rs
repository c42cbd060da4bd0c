//! Handler execution guard.
//!
//! Runs a handler future to completion, converting panics and (optionally)
//! overruns into [`HandlerError`]s.

use crate::domain::error::HandlerError;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Run `fut`, catching panics. With `limit` set, abandon it after that long.
pub async fn guarded<F>(fut: F, limit: Option<Duration>) -> Result<serde_json::Value, HandlerError>
where
    F: Future<Output = Result<serde_json::Value, HandlerError>>,
{
    let caught = AssertUnwindSafe(fut).catch_unwind();

    let outcome = match limit {
        Some(limit) => match timeout(limit, caught).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "Handler timed out");
                return Err(HandlerError::Timeout(limit));
            }
        },
        None => caught.await,
    };

    outcome.unwrap_or_else(|_| {
        warn!("Handler panicked");
        Err(HandlerError::Panicked)
    })
}
