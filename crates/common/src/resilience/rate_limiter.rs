//! Async token-bucket rate limiter
//!
//! Callers `acquire().await` one token before each outbound request. The
//! bucket allows bursts up to `capacity`, then refills `refill_amount`
//! tokens every `refill_interval`. Waiters are served one at a time, so a
//! limiter shared by every call of one client also serialises bursts.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Configuration for the token bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of tokens the bucket can hold
    pub capacity: u32,
    /// Number of tokens to refill per interval
    pub refill_amount: u32,
    /// Time interval for token refill
    pub refill_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { capacity: 10, refill_amount: 10, refill_interval: Duration::from_secs(1) }
    }
}

impl RateLimiterConfig {
    /// A bucket that allows `requests` per second with an equal burst.
    pub fn per_second(requests: u32) -> Self {
        Self { capacity: requests, refill_amount: requests, ..Self::default() }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be greater than 0".to_string());
        }
        if self.refill_interval.is_zero() {
            return Err("refill_interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
    // Serialises waiters so tokens are handed out in arrival order.
    gate: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    /// Create a new limiter with a full bucket
    pub fn new(config: RateLimiterConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(BucketState { tokens: config.capacity, last_refill: Instant::now() }),
            config,
            gate: tokio::sync::Mutex::new(()),
        })
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let intervals = elapsed.as_nanos() / self.config.refill_interval.as_nanos();
        if intervals == 0 {
            return;
        }
        let intervals = u32::try_from(intervals).unwrap_or(u32::MAX);
        let added = intervals.saturating_mul(self.config.refill_amount);
        state.tokens = state.tokens.saturating_add(added).min(self.config.capacity);
        state.last_refill += self.config.refill_interval * intervals.min(1_000_000);
        if state.tokens == self.config.capacity {
            state.last_refill = now;
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        let _turn = self.gate.lock().await;
        loop {
            let wait = {
                let mut state = self.state.lock();
                let now = Instant::now();
                self.refill(&mut state, now);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                (state.last_refill + self.config.refill_interval).saturating_duration_since(now)
            };
            debug!(?wait, "rate limit reached, waiting for refill");
            tokio::time::sleep(wait).await;
        }
    }
}
