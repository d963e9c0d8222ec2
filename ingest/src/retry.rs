//! Retry policy for whole-unit registry operations.

use std::future::Future;
use std::time::Duration;

use tally_client::ClientError;
use tally_utils::format_duration;

/// Delay before the first retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(11);

/// Upper bound on any single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// How often, and how patiently, a failed unit of work is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 0 retries forever.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failure. Values below 1.0
    /// are treated as 1.0.
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_RETRY_DELAY,
            backoff_factor: 1.0,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retry forever at a fixed delay.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: 0,
            initial_delay: delay,
            backoff_factor: 1.0,
            max_delay: delay,
        }
    }

    /// Up to `max_attempts` attempts with no delay in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts == 0 || attempts_made < self.max_attempts
    }

    /// Delay to wait after the `failed_attempt`-th failure (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_factor.max(1.0).powi(exponent);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// A value together with the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

impl<T> Attempted<T> {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// The policy ran out of attempts.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: ClientError,
}

/// Run `op` until it succeeds or `policy` gives up.
///
/// Each retry is awaited in place: the caller does not continue until the
/// operation has either produced a value or exhausted its attempts.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<Attempted<T>, Exhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => return Ok(Attempted { value, attempts }),
            Err(last_error) if !policy.allows_another(attempts) => {
                tracing::error!(target_unit = label, attempts, error = %last_error, "retries exhausted");
                return Err(Exhausted {
                    attempts,
                    last_error,
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempts);
                tracing::warn!(
                    target_unit = label,
                    attempt = attempts,
                    delay = %format_duration(delay),
                    error = %e,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
