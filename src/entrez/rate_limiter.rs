// Request pacing for E-utilities.
//
// NCBI allows 3 requests per second without an API key and 10 with one.
// Anything faster gets the caller's IP temporarily blocked. The limiter
// enforces a minimum interval between requests; it never retries.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Requests per second allowed without an API key.
pub const ANONYMOUS_RPS: f64 = 3.0;
/// Requests per second allowed with an API key.
pub const API_KEY_RPS: f64 = 10.0;

/// Enforces a minimum spacing between requests.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` requests per second.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                last_request: None,
            })),
        }
    }

    /// The limiter matching NCBI's policy for the given key setting.
    pub fn for_api_key(has_key: bool) -> Self {
        if has_key {
            Self::new(API_KEY_RPS)
        } else {
            Self::new(ANONYMOUS_RPS)
        }
    }

    /// Wait until a request is allowed, then return.
    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(last) = inner.last_request {
            let elapsed = last.elapsed();
            if elapsed < inner.interval {
                tokio::time::sleep(inner.interval - elapsed).await;
            }
        }

        // Held across the sleep so concurrent callers queue up in order.
        inner.last_request = Some(Instant::now());
    }
}
