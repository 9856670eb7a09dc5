//! Minimum spacing between outbound requests.

use std::time::{Duration, Instant};

use crate::utils::clock::Clock;

/// Blocks callers until `min_interval` has passed since the previous request.
///
/// One limiter belongs to one client instance; it covers every keyword that
/// client searches for.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Wait for the spacing to hold, then mark a request as sent now.
    pub async fn acquire(&mut self, clock: &dyn Clock) {
        if let Some(last) = self.last_request {
            let elapsed = clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                log::debug!("[rate-limit] Waiting {} ms", wait.as_millis());
                clock.sleep(wait).await;
            }
        }
        self.last_request = Some(clock.now());
    }
}
