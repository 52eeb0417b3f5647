/*!
 * Minimum spacing between provider requests.
 *
 * One limiter is meant to be shared (behind an `Arc`) by every client that
 * talks to the same provider account. The last-request timestamp is held
 * under an async mutex for the whole wait, so concurrent callers queue up
 * and each one starts at least `min_interval` after the previous one.
 */

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between consecutive request starts
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may start, then record the start time.
    ///
    /// Returns how long the caller was suspended.
    pub async fn acquire(&self) -> Duration {
        let mut last_request = self.last_request.lock().await;

        let waited = match *last_request {
            Some(last) => {
                let elapsed = last.elapsed();
                if elapsed < self.min_interval {
                    let shortfall = self.min_interval - elapsed;
                    tokio::time::sleep(shortfall).await;
                    shortfall
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };

        *last_request = Some(Instant::now());
        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
