//! Staged parsing pipeline for LLM output.
//!
//! LLMs reliably produce "JSON-ish" text: wrapped in commentary, fenced in
//! markdown, or near-JSON with single quotes, bare keys, and trailing
//! commas. A single rigid `serde_json::from_str` would fail unacceptably
//! often, so [`parse`] layers extraction, a logged repair pass, and schema
//! validation, and reports the trail of rewrites it applied either way.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract::{fenced_block, first_balanced_object};
use crate::repair::run_repairs;
use crate::schema::{SchemaContract, ValidationIssue};

/// Per-call parser configuration. Immutable for the duration of a call; no
/// state is shared across calls.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Run the textual repair pipeline when direct parsing fails.
    pub attempt_repair: bool,

    /// Pull the candidate out of the first fenced code block, if present.
    pub extract_from_markdown: bool,

    /// Reject inputs longer than this many bytes.
    pub max_length: usize,

    /// Surface the full repair log at debug level regardless of outcome.
    pub debug: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            attempt_repair: true,
            extract_from_markdown: true,
            max_length: 100_000,
            debug: false,
        }
    }
}

impl ParseConfig {
    /// Create a config with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the repair pipeline.
    pub fn with_attempt_repair(mut self, enabled: bool) -> Self {
        self.attempt_repair = enabled;
        self
    }

    /// Enable or disable markdown fence extraction.
    pub fn with_extract_from_markdown(mut self, enabled: bool) -> Self {
        self.extract_from_markdown = enabled;
        self
    }

    /// Set the maximum accepted input length in bytes.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Enable or disable debug logging of the repair trail.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }
}

/// Why parsing failed.
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// The input itself was unusable (empty or oversized).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// No syntactically valid JSON could be produced, with or without repair.
    #[error("extraction failed: {message}")]
    ExtractionFailed {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// JSON parsed but did not match the expected shape.
    #[error("schema mismatch: {} validation issue(s)", .issues.len())]
    SchemaMismatch { issues: Vec<ValidationIssue> },
}

impl ParseFailure {
    /// Structured issues for a schema mismatch; empty otherwise.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ParseFailure::SchemaMismatch { issues } => issues,
            _ => &[],
        }
    }
}

/// Result of [`parse`]: the typed value or a classified failure, with the
/// repair trail either way.
///
/// The repair log is ordered and append-only; it is diagnostic, never
/// semantically load-bearing.
#[derive(Debug)]
pub enum ParseOutcome<T> {
    Success {
        data: T,
        /// Every transformation that changed the text, in application order.
        repair_log: Vec<String>,
        /// The exact text that was handed to the JSON parser.
        extracted_text: String,
    },
    Failure {
        error: ParseFailure,
        repair_log: Vec<String>,
        /// Last attempted text, when extraction got that far.
        extracted_text: Option<String>,
    },
}

impl<T> ParseOutcome<T> {
    /// Whether this outcome carries data.
    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }

    /// The repair trail, regardless of outcome.
    pub fn repair_log(&self) -> &[String] {
        match self {
            ParseOutcome::Success { repair_log, .. } => repair_log,
            ParseOutcome::Failure { repair_log, .. } => repair_log,
        }
    }

    /// The typed value, discarding diagnostics.
    pub fn ok(self) -> Option<T> {
        match self {
            ParseOutcome::Success { data, .. } => Some(data),
            ParseOutcome::Failure { .. } => None,
        }
    }

    /// Convert into a plain `Result`, discarding diagnostics.
    pub fn into_result(self) -> Result<T, ParseFailure> {
        match self {
            ParseOutcome::Success { data, .. } => Ok(data),
            ParseOutcome::Failure { error, .. } => Err(error),
        }
    }
}

/// Parse untrusted LLM output into a schema-validated value.
///
/// Pipeline: length/empty preconditions, markdown fence extraction, first
/// balanced-object extraction, direct JSON parse, ordered textual repairs on
/// failure, then schema validation. Expected malformations never panic or
/// throw; they come back as [`ParseOutcome::Failure`] so callers must handle
/// both branches.
pub fn parse<S: SchemaContract>(
    text: &str,
    schema: &S,
    config: &ParseConfig,
) -> ParseOutcome<S::Output> {
    if text.is_empty() {
        return ParseOutcome::Failure {
            error: ParseFailure::InvalidInput {
                message: "response text is empty".to_string(),
            },
            repair_log: Vec::new(),
            extracted_text: None,
        };
    }
    if text.len() > config.max_length {
        return ParseOutcome::Failure {
            error: ParseFailure::InvalidInput {
                message: format!(
                    "response length {} exceeds configured maximum {}",
                    text.len(),
                    config.max_length
                ),
            },
            repair_log: Vec::new(),
            extracted_text: None,
        };
    }

    let mut repair_log: Vec<String> = Vec::new();
    let mut working = text.to_string();

    if config.extract_from_markdown {
        if let Some(inner) = fenced_block(&working) {
            let inner = inner.to_string();
            if inner != working {
                repair_log.push("extracted fenced code block".to_string());
                working = inner;
            }
        }
    }

    if let Some(span) = first_balanced_object(&working) {
        if span.len() < working.len() {
            let span = span.to_string();
            repair_log.push("extracted first balanced object".to_string());
            working = span;
        }
    }

    let parsed: Value = match serde_json::from_str(&working) {
        Ok(value) => value,
        Err(direct_error) => {
            if !config.attempt_repair {
                debug!(error = %direct_error, "direct parse failed and repair is disabled");
                return ParseOutcome::Failure {
                    error: ParseFailure::ExtractionFailed {
                        message: "text is not valid JSON and repair is disabled".to_string(),
                        source: Some(direct_error),
                    },
                    repair_log,
                    extracted_text: Some(working),
                };
            }

            let (repaired, mut applied) = run_repairs(&working);
            repair_log.append(&mut applied);

            match serde_json::from_str(&repaired) {
                Ok(value) => {
                    debug!(repairs = repair_log.len(), "parse succeeded after repair");
                    working = repaired;
                    value
                }
                Err(repair_error) => {
                    warn!(
                        repairs = repair_log.len(),
                        error = %repair_error,
                        "no valid JSON recoverable after repair"
                    );
                    if config.debug {
                        debug!(repair_log = ?repair_log, text = %repaired, "repair trail");
                    }
                    return ParseOutcome::Failure {
                        error: ParseFailure::ExtractionFailed {
                            message: "no valid JSON recoverable after repair".to_string(),
                            source: Some(repair_error),
                        },
                        repair_log,
                        extracted_text: Some(repaired),
                    };
                }
            }
        }
    };

    match schema.validate(&parsed) {
        Ok(data) => {
            if config.debug {
                debug!(repair_log = ?repair_log, "parse succeeded");
            }
            ParseOutcome::Success {
                data,
                repair_log,
                extracted_text: working,
            }
        }
        Err(issues) => {
            warn!(issue_count = issues.len(), "parsed JSON failed schema validation");
            if config.debug {
                debug!(repair_log = ?repair_log, issues = ?issues, "validation issues");
            }
            ParseOutcome::Failure {
                error: ParseFailure::SchemaMismatch { issues },
                repair_log,
                extracted_text: Some(working),
            }
        }
    }
}
