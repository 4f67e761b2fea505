//! Backpressure for Search Console calls.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Enforces a concurrency ceiling and a minimum spacing between request starts.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_delay: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            min_delay,
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    /// Waits until a request may start. Hold the guard for the request's lifetime.
    pub async fn acquire(&self) -> RateLimitGuard {
        // the semaphore is never closed, so acquisition only fails if that changes
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        {
            let mut last = self.last_request.lock().await;
            if let Some(prev) = *last {
                let elapsed = prev.elapsed();
                if elapsed < self.min_delay {
                    tokio::time::sleep(self.min_delay - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        RateLimitGuard { _permit: permit }
    }
}

/// Releases the concurrency slot when dropped.
pub struct RateLimitGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_not_delayed() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let started = Instant::now();
        let _g = limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn spacing_is_enforced() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));
        let started = Instant::now();
        let _g1 = limiter.acquire().await;
        let _g2 = limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn concurrency_ceiling_blocks() {
        let limiter = RateLimiter::new(1, Duration::ZERO);
        let g1 = limiter.acquire().await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());
        drop(g1);
        let _g2 = tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await.unwrap();
    }
}
