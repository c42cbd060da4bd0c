//! Per-caller sliding-window rate limiting.
//!
//! Each caller keeps the arrival times of its accepted requests. On every
//! check, timestamps at or before `now - window` are purged and the rest are
//! counted. Rejected attempts are not recorded.
//!
//! The purge-count-append sequence runs under one mutex, so concurrent checks
//! for the same caller cannot double-count. Tracked callers are bounded by an
//! LRU; evicting a caller forgets its window.

use crate::domain::config::RateLimitConfig;
use crate::domain::envelope::CallerId;
use crate::ports::TimeSource;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rate limiter state shared across requests
pub struct RateLimitState {
    /// Per-caller accepted request timestamps (ms)
    windows: Mutex<LruCache<CallerId, VecDeque<u64>>>,
    window_ms: u64,
    max_requests: usize,
}

impl RateLimitState {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_tracked_callers).unwrap_or(NonZeroUsize::MIN);
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
            window_ms: config.window_ms(),
            max_requests: config.max_requests as usize,
        }
    }

    /// Check with the configured window and limit, recording on success.
    pub fn try_consume(&self, caller: Option<&CallerId>, now_ms: u64) -> bool {
        self.try_consume_with(caller, now_ms, self.window_ms, self.max_requests)
    }

    /// Check with an explicit window and limit, recording on success.
    ///
    /// An absent caller can never pass.
    pub fn try_consume_with(
        &self,
        caller: Option<&CallerId>,
        now_ms: u64,
        window_ms: u64,
        max_requests: usize,
    ) -> bool {
        let Some(caller) = caller else {
            return false;
        };

        let mut windows = self.windows.lock();
        let timestamps = windows.get_or_insert_mut(caller.clone(), || {
            debug!(caller = %caller, "Creating rate limit window");
            VecDeque::new()
        });

        purge(timestamps, now_ms, window_ms);

        if timestamps.len() >= max_requests {
            return false;
        }

        timestamps.push_back(now_ms);
        true
    }

    /// Purge stale timestamps for every caller and drop empty windows.
    ///
    /// Returns the number of callers removed.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let mut windows = self.windows.lock();

        let mut empty = Vec::new();
        for (caller, timestamps) in windows.iter_mut() {
            purge(timestamps, now_ms, self.window_ms);
            if timestamps.is_empty() {
                empty.push(caller.clone());
            }
        }

        for caller in &empty {
            windows.pop(caller);
        }

        if !empty.is_empty() {
            debug!(removed = empty.len(), remaining = windows.len(), "Swept idle rate limit windows");
        }
        empty.len()
    }

    /// Recorded timestamps for `caller` (without purging or touching LRU order)
    pub fn window_len(&self, caller: &CallerId) -> usize {
        self.windows.lock().peek(caller).map_or(0, VecDeque::len)
    }

    /// Number of callers currently tracked
    pub fn tracked_callers(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }
}

/// Drop timestamps `<= now - window`. Nothing is stale before the first full window.
fn purge(timestamps: &mut VecDeque<u64>, now_ms: u64, window_ms: u64) {
    if let Some(cutoff) = now_ms.checked_sub(window_ms) {
        timestamps.retain(|&t| t > cutoff);
    }
}

/// Background task sweeping idle caller windows
pub async fn sweep_task(state: Arc<RateLimitState>, clock: Arc<dyn TimeSource>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        state.sweep(clock.now_ms());
    }
}
