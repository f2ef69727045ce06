//! Fixed-delay retry policy.
//!
//! A [`RetryPolicy`] runs an attempt up to a maximum number of times with a
//! constant pause between attempts. A classifier decides which errors are
//! permanent; those end the sequence immediately.
//!
//! ```rust
//! use stor_client::downloader::RetryPolicy;
//! use stor_client::Error;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Error> {
//! let policy = RetryPolicy::new(3, Duration::from_millis(10));
//! let value = policy
//!     .execute(|attempt| async move {
//!         if attempt < 3 {
//!             Err(Error::Internal("not yet".into()))
//!         } else {
//!             Ok(attempt)
//!         }
//!     }, Error::is_permanent)
//!     .await?;
//! assert_eq!(value, 3);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};

use backon::{ConstantBuilder, Retryable};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// Default number of attempts per blob.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 10;
/// Default pause between two attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Attempt count and constant inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Create a policy making at most `attempts` attempts, at least one.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts, at least one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between two attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `attempt` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// `attempt` receives the 1-based attempt number. The error of the last
    /// attempt is returned on failure.
    pub async fn execute<T, F, Fut, P>(&self, mut attempt: F, is_permanent: P) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&Error) -> bool,
    {
        let backoff = ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.attempts as usize - 1);
        let made = AtomicU32::new(0);

        let result = (|| attempt(made.fetch_add(1, Ordering::Relaxed) + 1))
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(|err| !is_permanent(err))
            .notify(|err, delay| {
                debug!(
                    attempt = made.load(Ordering::Relaxed),
                    attempts = self.attempts,
                    ?delay,
                    "Retry #{}: {}",
                    made.load(Ordering::Relaxed),
                    err
                );
            })
            .await;

        if let Err(ref err) = result {
            let n = made.load(Ordering::Relaxed);
            if is_permanent(err) {
                debug!(attempt = n, "Permanent failure, not retrying: {}", err);
            } else {
                debug!(attempt = n, "Giving up after {} attempts: {}", n, err);
            }
        }
        result
    }
}
