use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

/// Client-side throttle for outbound quote requests.
///
/// The free tiers of the quote providers are tight (Alpha Vantage allows
/// 5 requests per minute, Finnhub 60), and blowing the quota turns every
/// subsequent call into an error for the rest of the window. Each provider
/// owns one limiter and calls [`acquire`](Self::acquire) before every request.
pub struct RateLimiter {
    /// Caps in-flight requests.
    semaphore: Arc<Semaphore>,
    /// When the previous request went out, for spacing.
    last_request: Arc<Mutex<Instant>>,
    /// Minimum spacing between consecutive requests.
    min_delay: Duration,
}

impl RateLimiter {
    /// A limiter that spaces requests evenly across the minute and allows at
    /// most `max_concurrent` of them in flight at once.
    pub fn per_minute(requests_per_minute: u32, max_concurrent: usize) -> Self {
        let min_delay_ms = 60_000 / u64::from(requests_per_minute.max(1));
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Waits until a request may go out: first for an in-flight slot, then
    /// for the spacing delay. Returns a guard that frees the slot on drop.
    pub async fn acquire(&self) -> RateLimitGuard {
        // Semaphore is never closed, so acquire cannot fail.
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();
            (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
        };
        // sleep outside the lock
        if let Some(delay) = wait {
            sleep(delay).await;
        }

        *self.last_request.lock() = Instant::now();
        RateLimitGuard { _permit: permit }
    }
}

/// Releases the in-flight slot when dropped.
pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
