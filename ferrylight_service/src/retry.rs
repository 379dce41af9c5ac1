//! Retry with exponential backoff for upstream calls.
//!
//! The policy is pure: `decide` looks at one error and the number of
//! retries already made and returns either a delay or a verdict to give up.
//! `run` drives an attempt closure with that policy, sleeping between
//! attempts. Nothing here is shared between requests, so concurrent
//! requests retry independently.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::error::UpstreamError;
use crate::logging::{self, DataSource};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

/// Outcome of consulting the policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the delay, then try again.
    Retry(Duration),
    /// Give up and surface the error.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay", with = "millis")]
    pub base_delay: Duration,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay() -> Duration {
    Duration::from_millis(DEFAULT_BASE_DELAY_MS)
}

fn default_backoff_multiplier() -> u32 {
    DEFAULT_BACKOFF_MULTIPLIER
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry_count` (0-indexed):
    /// `base_delay * backoff_multiplier ^ retry_count`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(retry_count);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide what to do after `err`, given `retry_count` retries already made.
    pub fn decide(&self, err: &UpstreamError, retry_count: u32) -> RetryDecision {
        if retry_count >= self.max_retries || !err.is_retryable() {
            return RetryDecision::Fail;
        }
        RetryDecision::Retry(self.delay_for(retry_count))
    }

    /// Total attempts this policy allows, first call included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Log line for a scheduled retry. The attempt number is the one about
    /// to start after the delay, 1-based, so the first retry reads "2/4".
    fn retry_message(&self, err: &UpstreamError, delay: Duration, retry_count: u32) -> String {
        format!(
            "{}; retrying request in {}ms (attempt {}/{})",
            err,
            delay.as_millis(),
            retry_count + 2,
            self.max_attempts()
        )
    }

    /// Run `attempt` until it succeeds or the policy gives up.
    ///
    /// The last error is returned unchanged, so callers can tell a 404 from
    /// an exhausted run of timeouts by looking at it.
    pub async fn run<T, F, Fut>(&self, source: DataSource, mut attempt: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut retry_count = 0;
        loop {
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.decide(&err, retry_count) {
                RetryDecision::Retry(delay) => {
                    logging::info(source, None, &self.retry_message(&err, delay, retry_count));
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                RetryDecision::Fail => {
                    logging::debug(
                        source,
                        None,
                        &format!("giving up after {} attempt(s): {}", retry_count + 1, err),
                    );
                    return Err(err);
                }
            }
        }
    }
}

/// Durations written as plain milliseconds in config files.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
