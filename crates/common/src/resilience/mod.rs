//! Resilience patterns for calls against rate-limited, unreliable APIs
//!
//! - **Retry**: bounded attempts with exponential backoff, driven by a
//!   [`RetryPolicy`] that classifies each typed error as retryable or not.
//!   The executor returns a typed [`RetryResult`]; exhausting every attempt
//!   hands back the last error instead of a bare count.
//! - **Rate limiting**: an async token bucket that callers await before each
//!   request, which both throttles and serialises bursts per client.

pub mod rate_limiter;
pub mod retry;

// Re-export rate limiter types
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
// Re-export retry types
pub use retry::{
    BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryPolicy, RetryResult,
};
