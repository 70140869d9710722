//! Randomized pauses and retry backoff
//!
//! Pauses are drawn uniformly from a [`DelayRange`]. A zero range never
//! sleeps, which keeps fixture-driven runs instant.

use crate::config::DelayRange;
use rand::Rng;
use std::time::Duration;

/// Uniformly random pause between two pieces of network work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    range: DelayRange,
}

impl Jitter {
    pub const fn new(range: DelayRange) -> Self {
        Self { range }
    }

    /// Draws one delay from the range
    pub fn sample(&self) -> Duration {
        let DelayRange { min_ms, max_ms } = self.range;
        if max_ms == 0 || min_ms >= max_ms {
            return Duration::from_millis(min_ms.min(max_ms));
        }
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    /// Sleeps for one sampled delay
    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl From<DelayRange> for Jitter {
    fn from(range: DelayRange) -> Self {
        Self::new(range)
    }
}

/// Exponential backoff with a little jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    jitter_percent: u64,
}

impl Backoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter_percent: 10,
        }
    }

    pub fn with_jitter(mut self, jitter_percent: u64) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        let capped = exponential.min(self.max_ms);
        let jitter = if self.jitter_percent > 0 && capped > 0 {
            rand::thread_rng().gen_range(0..capped / self.jitter_percent + 1)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }

    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
