//! Retry with exponential backoff for LLM provider calls.
//!
//! Wraps a single async operation in a bounded retry loop. Errors are
//! classified through [`ClassifyError`]: transient failures are retried with
//! capped, jittered exponential backoff, a provider-supplied retry-after hint
//! takes precedence over the computed delay, and fatal errors surface
//! immediately. Attempts within one call are strictly sequential; nothing is
//! shared across calls, so concurrent callers never interfere.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{ClassifyError, RetryClass};

/// Configuration for retrying failed LLM calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each retry (e.g. 2.0 to double).
    pub exponential_base: f64,

    /// Ceiling on the computed delay, in milliseconds.
    pub max_delay_ms: u64,

    /// Whether to add random jitter to computed delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            exponential_base: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with the given retry budget.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = base;
        self
    }

    /// Set the ceiling on computed delays.
    pub fn with_max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retrying after the given attempt (1-based).
    ///
    /// Exponential backoff: `initial_delay * base^(attempt-1)`, capped at
    /// `max_delay`. Jitter adds a uniform extra of up to 10% of the capped
    /// value. Floored to whole milliseconds.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = (self.initial_delay_ms as f64) * self.exponential_base.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let with_jitter = if self.jitter {
            let extra = rand::thread_rng().gen_range(0.0..=capped * 0.1);
            capped + extra
        } else {
            capped
        };

        Duration::from_millis(with_jitter.floor() as u64)
    }
}

/// One failed attempt, kept for the final aggregated error report.
#[derive(Debug)]
struct AttemptRecord {
    attempt: u32,
    elapsed: Duration,
    error: String,
}

/// Execute an async operation with classified retries and backoff.
///
/// The operation is invoked at most `policy.max_retries + 1` times. Fatal
/// errors are returned immediately; retryable errors are absorbed until the
/// budget is exhausted, at which point the most recent error is returned and
/// the full attempt history is logged.
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: ClassifyError + std::fmt::Display,
{
    let started = Instant::now();
    let mut history: Vec<AttemptRecord> = Vec::new();
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation recovered after retries");
                }
                return Ok(value);
            }
            Err(error) => {
                history.push(AttemptRecord {
                    attempt,
                    elapsed: started.elapsed(),
                    error: error.to_string(),
                });

                if attempt > policy.max_retries {
                    let summary: Vec<String> = history
                        .iter()
                        .map(|r| format!("attempt {} ({}ms): {}", r.attempt, r.elapsed.as_millis(), r.error))
                        .collect();
                    warn!(
                        attempts = attempt,
                        history = %summary.join("; "),
                        "retries exhausted"
                    );
                    return Err(error);
                }

                let delay = match error.retry_class() {
                    RetryClass::RateLimited { retry_after } => {
                        // The provider knows its own rate-limit window; its
                        // hint wins when it is longer than our backoff.
                        let backoff = policy.backoff_delay(attempt);
                        let delay = retry_after.map_or(backoff, |hint| hint.max(backoff));
                        warn!(
                            attempt,
                            max_retries = policy.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "rate limited, backing off"
                        );
                        delay
                    }
                    RetryClass::Retryable => {
                        let delay = policy.backoff_delay(attempt);
                        warn!(
                            attempt,
                            max_retries = policy.max_retries,
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "transient failure, will retry"
                        );
                        delay
                    }
                    RetryClass::Fatal => {
                        warn!(attempt, error = %error, "fatal error, not retrying");
                        return Err(error);
                    }
                };

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Policy-holding wrapper around [`execute_with_retry`].
///
/// Lets the composing layer build one retrier and reuse it across calls
/// without re-threading the policy.
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    /// Create a retrier with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this retrier applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run an operation under this retrier's policy.
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ClassifyError + std::fmt::Display,
    {
        execute_with_retry(&self.policy, operation).await
    }
}
