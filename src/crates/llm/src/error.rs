//! Error types and retry classification for LLM provider calls.

use std::time::Duration;

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// HTTP statuses worth retrying: rate limiting and transient server failures.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors that can occur when calling an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider returned a non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Provider-supplied minimum wait before retrying, from the
        /// `retry-after` header on rate-limit responses.
        retry_after: Option<Duration>,
    },

    /// Could not reach the provider at all.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request timed out in flight.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The surrounding context was aborted. Never retried.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Provider responded but the body was unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),
}

/// How the retry executor should treat a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Transient; retry after the computed backoff.
    Retryable,
    /// Rate limited; retry after `max(retry_after, backoff)`.
    RateLimited { retry_after: Option<Duration> },
    /// Permanent; surface immediately without retrying.
    Fatal,
}

/// Classification contract the retry executor works against.
///
/// Keeping this a trait (rather than matching on [`LlmError`] directly)
/// keeps the executor independent of any one provider's error shape.
pub trait ClassifyError {
    /// Classify this error as retryable, rate-limited, or fatal.
    fn retry_class(&self) -> RetryClass;
}

impl ClassifyError for LlmError {
    fn retry_class(&self) -> RetryClass {
        match self {
            LlmError::Api {
                status: 429,
                retry_after,
                ..
            } => RetryClass::RateLimited {
                retry_after: *retry_after,
            },
            LlmError::Api { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                RetryClass::Retryable
            }
            LlmError::Connection(_) | LlmError::Timeout(_) => RetryClass::Retryable,
            _ => RetryClass::Fatal,
        }
    }
}

impl LlmError {
    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.retry_class(), RetryClass::Fatal)
    }

    /// HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::Connection(err.to_string())
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            LlmError::Api {
                status: status.as_u16(),
                message: err.to_string(),
                retry_after: None,
            }
        } else {
            LlmError::Connection(err.to_string())
        }
    }
}
