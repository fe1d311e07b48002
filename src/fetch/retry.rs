//! Retry with capped exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Backoff parameters for retried upstream calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1`, without jitter. Attempts are
    /// 1-based.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = self.base_delay.as_millis() as f64 * exp;
        Duration::from_millis((delay as u64).min(self.max_delay.as_millis() as u64))
    }

    /// Backoff with uniform 0.7–1.3 jitter applied, so synchronized callers
    /// spread out instead of retrying in lockstep
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff(attempt).as_millis() as f64;
        let factor = rand::thread_rng().gen_range(0.7..1.3);
        Duration::from_millis((base * factor) as u64)
    }
}

/// Runs `op` up to `policy.max_retries` times. Only retryable failures
/// (network, timeout, 5xx) re-enter the loop; everything else — including
/// 404 and 429 — surfaces immediately. The attempt number is passed to `op`
/// so callers can key coalescing per attempt.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        if token.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.jittered_backoff(attempt);
                tracing::debug!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying upstream call"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => return Err(FetchError::Cancelled),
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
