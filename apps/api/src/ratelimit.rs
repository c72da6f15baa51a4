use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval gate for calls to a rate-sensitive external service.
///
/// Each client owns exactly one limiter, so limiting is per service category:
/// concurrent calls to different services never delay each other. There is no
/// burst allowance; N contenders on one limiter drain at `min_interval`
/// spacing, in whatever order they acquire the lock.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until at least `min_interval` has elapsed since the previous
    /// `wait` on this instance returned, then records the new call time.
    /// The lock is held across the sleep so concurrent callers serialize
    /// instead of racing the clock.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
