//! Client-side limiter for feed connection attempts
//!
//! Implements GCRA (Generic Cell Rate Algorithm) via governor crate.
//! The public book endpoint accepts 20 connections per minute per IP; reconnect
//! attempts stay below that at 15/minute with a 30s queue timeout.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Maximum connection attempts per minute
const MAX_CONNECTIONS_PER_MINUTE: u32 = 15;

/// Maximum time to wait for a connection slot
const QUEUE_TIMEOUT_SECS: u64 = 30;

/// Polling interval while waiting for a slot
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Rate limiter errors
#[derive(Debug, Error)]
pub enum RateLimiterError {
    #[error("Connection attempt queue timeout after {0}s")]
    QueueTimeout(u64),
}

/// Limiter for WebSocket (re)connection attempts
pub struct RateLimiter {
    limiter: GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    queue_timeout: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings
    ///
    /// - Limit: 15 connection attempts/minute
    /// - Queue timeout: 30 seconds
    pub fn new() -> Self {
        Self::with_quota(MAX_CONNECTIONS_PER_MINUTE, QUEUE_TIMEOUT_SECS)
    }

    /// Create a rate limiter with custom settings
    ///
    /// A zero quota is raised to one attempt per minute.
    pub fn with_quota(attempts_per_minute: u32, queue_timeout_secs: u64) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: GovernorRateLimiter::direct(quota),
            queue_timeout: Duration::from_secs(queue_timeout_secs),
        }
    }

    /// Wait until a connection attempt is allowed
    ///
    /// Each successful call consumes one slot. Returns Err if no slot frees up
    /// within the queue timeout.
    pub async fn wait(&self) -> Result<(), RateLimiterError> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }

        warn!("Connection attempts throttled, waiting for a free slot");

        let waited = timeout(self.queue_timeout, async {
            while self.limiter.check().is_err() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            debug!("Connection attempt permitted");
        })
        .await;

        waited.map_err(|_| {
            warn!(
                timeout_secs = self.queue_timeout.as_secs(),
                "Connection attempt queue timeout exceeded"
            );
            RateLimiterError::QueueTimeout(self.queue_timeout.as_secs())
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
