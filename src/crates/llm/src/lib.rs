//! LLM provider plumbing for tailorkit.
//!
//! Three pieces, composed by the (external) route layer:
//! - [`client::ChatClient`] — a caller-owned OpenAI-compatible chat client.
//! - [`error::LlmError`] — provider errors with a retry classification
//!   ([`error::ClassifyError`]) distinguishing transient from fatal failures.
//! - [`retry::execute_with_retry`] — bounded, jittered exponential backoff
//!   around any async operation whose error type is classifiable.
//!
//! The retry executor is provider-agnostic: it depends only on the
//! classification contract, not on this crate's concrete client.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::{ChatClient, ChatMessage};
pub use config::OpenAiConfig;
pub use error::{ClassifyError, LlmError, Result, RetryClass};
pub use retry::{execute_with_retry, Retrier, RetryPolicy};
