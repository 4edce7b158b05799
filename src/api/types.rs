//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core_state::CoreState;
use crate::models::Hospital;
use crate::realtime::{ChangeEvent, HospitalFeed};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_limits(core: Arc<CoreState>, per_minute: u32, per_hour: u32) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::with_limits(per_minute, per_hour))),
        }
    }

    pub fn hospital_feed(&self) -> &HospitalFeed {
        self.core.hospital_feed()
    }

    pub fn publish_hospital(&self, event: ChangeEvent<Hospital>) {
        let delivered = self.hospital_feed().publish(event);
        tracing::debug!(subscribers = delivered, "Published hospital change");
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Body for every `PATCH .../status` route.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Sweep idle clients once this many are tracked.
const SWEEP_THRESHOLD: usize = 1000;

const HOUR: Duration = Duration::from_secs(3600);

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(100, 1000)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, client: &str) -> Result<(), u64> {
        let now = Instant::now();
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }
        let entries = self.windows.entry(client.to_string()).or_default();

        // Clean entries older than 1 hour
        entries.retain(|ts| now.duration_since(*ts) < HOUR);

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drop clients with no request inside the last hour.
    fn sweep(&mut self, now: Instant) {
        self.windows.retain(|_, entries| {
            entries.retain(|ts| now.duration_since(*ts) < HOUR);
            !entries.is_empty()
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
