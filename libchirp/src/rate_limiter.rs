//! Token bucket rate limiting for outbound requests
//!
//! One limiter is constructed per process and shared by reference between
//! submissions. Waiting for a permit can be aborted through a
//! [`CancelSignal`].

use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{sleep, Instant};

use crate::error::PostError;

/// Create a linked cancel trigger and signal
pub fn cancellation() -> (CancelTrigger, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelTrigger { tx }, CancelSignal { rx })
}

/// Owner side of a cancellation pair
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

impl CancelTrigger {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side of a cancellation pair
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the trigger
    /// was dropped without cancelling
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Rate limiter for outbound requests
///
/// Holds up to `burst` permits and regains one every `interval`.
pub struct RateLimiter {
    burst: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, burst: u32, interval: Duration, now: Instant) {
        // A full bucket does not bank time toward the next permit
        if self.tokens >= burst {
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = (elapsed.as_nanos() / interval.as_nanos()).min(u128::from(burst)) as u32;
        if earned == 0 {
            return;
        }

        self.tokens = (self.tokens + earned).min(burst);
        if self.tokens == burst {
            self.last_refill = now;
        } else {
            self.last_refill += interval * earned;
        }
    }
}

impl RateLimiter {
    /// Create a limiter that starts full
    pub fn new(burst: u32, interval: Duration) -> Self {
        let burst = burst.max(1);
        Self {
            burst,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Build from the `[limits]` section of the configuration
    pub fn from_config(limits: &crate::config::LimitsConfig) -> Self {
        Self::new(limits.rate_limit_burst, limits.rate_limit_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a permit
    ///
    /// # Errors
    ///
    /// `PostError::RateLimitCancelled` if `cancel` fires before a permit is
    /// available.
    pub async fn acquire(&self, cancel: &CancelSignal) -> Result<(), PostError> {
        if self.interval.is_zero() {
            return Ok(());
        }

        loop {
            if cancel.is_cancelled() {
                return Err(PostError::RateLimitCancelled);
            }

            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                bucket.refill(self.burst, self.interval, now);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return Ok(());
                }
                self.interval
                    .saturating_sub(now.saturating_duration_since(bucket.last_refill))
            };

            tracing::debug!("Rate limited, waiting {:?} for next permit", wait);

            tokio::select! {
                _ = sleep(wait) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Rate limit wait cancelled");
                    return Err(PostError::RateLimitCancelled);
                }
            }
        }
    }
}
