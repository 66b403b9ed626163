//! Bounded retry of read-compare-write cycles that lose an optimistic concurrency race.

use std::{future::Future, time::Duration};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Backoff settings for conflicting writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before giving up, including the first one. At least one attempt is always made.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Default::default() }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Rejects settings the backoff cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::InvalidRetry(format!("backoff_multiplier must be a finite number of at least 1, got {}", self.backoff_multiplier)));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(Error::InvalidRetry(format!(
                "initial_delay_ms {} exceeds max_delay_ms {}",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// `delay * factor`, or `cap` when the product is larger or not a valid duration.
fn scale(delay: Duration, factor: f64, cap: Duration) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).map_or(cap, |scaled| scaled.min(cap))
}

/// Runs `operation` until it succeeds, fails with anything but a conflict, or runs out of attempts.
///
/// Each attempt must start from a fresh read. Exhaustion is reported as [`Error::RetriesExhausted`].
pub async fn retry_on_conflict<F, Fut, T>(config: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let max_delay = Duration::from_millis(config.max_delay_ms);
    let mut delay = Duration::from_millis(config.initial_delay_ms).min(max_delay);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Err(e) if e.is_conflict() => {
                if attempt >= max_attempts {
                    tracing::error!("[NG.Retry] {operation_name} failed after {attempt} attempts: {e}");
                    return Err(Error::RetriesExhausted {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                    });
                }
                // jitter between 0.5x and 1.5x keeps racing writers apart
                let jitter = rand::rng().random_range(0.5..1.5);
                let jittered = scale(delay, jitter, Duration::MAX);
                tracing::warn!("[NG.Retry] {operation_name} attempt {attempt} conflicted, retrying in {}ms: {e}", jittered.as_millis());
                if !jittered.is_zero() {
                    tokio::time::sleep(jittered).await;
                }
                delay = scale(delay, config.backoff_multiplier, max_delay);
            }
            result => return result,
        }
    }
}
