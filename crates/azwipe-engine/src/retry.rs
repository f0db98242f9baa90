//! Bounded exponential backoff around platform calls.

use azwipe_config::RetrySettings;
use azwipe_core::{Result, TransientKind};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy invoked explicitly around each delete call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to jittered failure classes.
    pub max_jitter: Duration,
    /// Transient classes that are retried. Anything else propagates at once.
    pub retryable: HashSet<TransientKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: settings.base_delay,
            max_delay: settings.max_delay,
            max_jitter: Duration::from_secs(1),
            retryable: settings.retryable.iter().copied().collect(),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry following the zero-based `attempt`.
    ///
    /// `min(base * 2^attempt + jitter, max_delay)`, with jitter only for jittered classes.
    pub fn delay_for(&self, attempt: u32, kind: TransientKind) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let jitter = if kind.is_jittered() && !self.max_jitter.is_zero() {
            self.max_jitter.mul_f64(rand::random::<f64>())
        } else {
            Duration::ZERO
        };
        exponential.saturating_add(jitter).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget is spent.
    ///
    /// The last error is returned when retries are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(kind) = err
                .transient_kind()
                .filter(|kind| self.retryable.contains(kind))
            else {
                return Err(err);
            };

            if attempt + 1 >= self.max_attempts {
                warn!(
                    operation,
                    attempts = attempt + 1,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(err);
            }

            let delay = self.delay_for(attempt, kind);
            warn!(
                operation,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
