//! Pacing of follow-up candidates.
//!
//! The explorer waits on its [`Throttle`] once for every candidate question a
//! node produces, before it decides whether that candidate is expanded. A node
//! with five candidates therefore waits five times even when none of them are
//! researched.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ExplorationConfig, ThrottleStrategy};

/// Default rate limit, in candidates per minute
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 45;

/// Gate awaited once per follow-up candidate.
#[async_trait]
pub trait Throttle: Send + Sync + std::fmt::Debug {
    /// Wait before handling the next candidate of a node at `depth`
    async fn wait(&self, depth: usize);
}

/// Build the throttle selected by configuration
pub fn from_config(config: &ExplorationConfig) -> Arc<dyn Throttle> {
    match config.throttle {
        ThrottleStrategy::Sleep => Arc::new(FixedDelay::per_minute(config.requests_per_minute)),
        ThrottleStrategy::TokenBucket => {
            Arc::new(TokenBucket::per_minute(config.requests_per_minute))
        }
    }
}

/// Sleeps for a fixed interval on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Sleep `60 / rate` seconds per call. A zero rate is treated as one.
    pub fn per_minute(rate: u32) -> Self {
        Self::new(Duration::from_secs(60) / rate.max(1))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn wait(&self, depth: usize) {
        tracing::debug!(depth, delay_ms = self.delay.as_millis() as u64, "Rate limit sleep");
        tokio::time::sleep(self.delay).await;
    }
}

/// Token bucket with a per-minute quota and no burst.
///
/// Unlike [`FixedDelay`], time already spent on network calls counts toward
/// the interval, so a slow node does not also pay the full sleep.
pub struct TokenBucket {
    limiter: DefaultDirectRateLimiter,
    rate: NonZeroU32,
}

impl TokenBucket {
    /// A zero rate is treated as one.
    pub fn per_minute(rate: u32) -> Self {
        let rate = NonZeroU32::new(rate).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(rate).allow_burst(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(quota),
            rate,
        }
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("per_minute", &self.rate)
            .finish()
    }
}

#[async_trait]
impl Throttle for TokenBucket {
    async fn wait(&self, depth: usize) {
        tracing::debug!(depth, "Waiting for rate limit permit");
        self.limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_default_rate() {
        let throttle = FixedDelay::default();
        assert_eq!(throttle.delay(), Duration::from_secs(60) / 45);
        assert_eq!(throttle.delay().as_millis(), 1333);
    }

    #[test]
    fn test_fixed_delay_zero_rate() {
        assert_eq!(FixedDelay::per_minute(0).delay(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_sleeps() {
        let throttle = FixedDelay::per_minute(45);
        let start = tokio::time::Instant::now();

        throttle.wait(0).await;
        throttle.wait(0).await;

        assert!(start.elapsed() >= Duration::from_millis(2666));
    }

    #[tokio::test]
    async fn test_token_bucket_first_permit_is_immediate() {
        let throttle = TokenBucket::per_minute(45);
        let start = std::time::Instant::now();
        throttle.wait(0).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_token_bucket_paces_later_permits() {
        // 600 per minute is one permit every 100ms.
        let throttle = TokenBucket::per_minute(600);
        let start = std::time::Instant::now();

        throttle.wait(0).await;
        throttle.wait(0).await;
        throttle.wait(1).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(180), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_from_config_selects_strategy() {
        let mut config = ExplorationConfig::default();
        assert!(format!("{:?}", from_config(&config)).starts_with("FixedDelay"));

        config.throttle = ThrottleStrategy::TokenBucket;
        assert!(format!("{:?}", from_config(&config)).starts_with("TokenBucket"));
    }
}
