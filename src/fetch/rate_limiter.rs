//! Sliding fixed-window request budget shared across all upstream calls.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Denied callers retry at this cadence instead of being dropped
const QUEUE_RETRY_DELAY: Duration = Duration::from_millis(100);

struct Window {
    started_at: Instant,
    requests: u32,
}

/// Fixed-window rate limiter with a FIFO wait queue.
///
/// `try_acquire` is the non-blocking window check. `acquire` is what the
/// fetch path uses: callers that miss the budget queue up behind a fair
/// async mutex and re-check every 100ms, so burst load degrades into
/// latency instead of failures.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Window>,
    /// Fair mutex: waiters are admitted in arrival order
    queue: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            state: Mutex::new(Window {
                started_at: Instant::now(),
                requests: 0,
            }),
            queue: tokio::sync::Mutex::new(()),
        }
    }

    /// Takes one slot from the current window if any remain
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();

        if now.duration_since(state.started_at) > self.window {
            state.started_at = now;
            state.requests = 0;
        }

        if state.requests < self.max_requests {
            state.requests += 1;
            true
        } else {
            false
        }
    }

    /// Waits FIFO for a slot, or returns `Cancelled` if the token fires
    /// first
    pub async fn acquire(&self, token: &CancellationToken) -> Result<(), FetchError> {
        if self.try_acquire() {
            return Ok(());
        }

        let _queued = self.queue.lock().await;
        loop {
            if token.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            if self.try_acquire() {
                return Ok(());
            }
            tokio::select! {
                _ = tokio::time::sleep(QUEUE_RETRY_DELAY) => {}
                _ = token.cancelled() => return Err(FetchError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_in_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_window_reset() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_queues_until_window_turns() {
        let limiter = RateLimiter::new(2, Duration::from_millis(120));
        let token = CancellationToken::new();

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        let started = Instant::now();
        limiter.acquire(&token).await.unwrap();
        // The third caller had to wait for the next window
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_acquire_cancelled_while_queued() {
        tokio_test::block_on(async {
            let limiter = RateLimiter::new(1, Duration::from_secs(60));
            let token = CancellationToken::new();
            assert!(limiter.try_acquire());

            token.cancel();
            let result = limiter.acquire(&token).await;
            assert_eq!(result, Err(FetchError::Cancelled));
        });
    }
}
