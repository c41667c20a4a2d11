//! Schema contract for validating parsed LLM output.
//!
//! A schema turns an untyped `serde_json::Value` into a typed value, or a
//! list of structured issues pointing at the offending paths. The parser
//! treats schemas as an injected contract and never inspects the typed
//! output itself.

use std::fmt;

use serde_json::Value;

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// A single validation failure with the path to the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    /// Create an issue at the given path.
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Create an issue at a single top-level key.
    pub fn at_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::Key(key.into())], message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "$")?;
        }
        for (i, segment) in self.path.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Contract a caller supplies to [`crate::parser::parse`].
///
/// Implementations are permissive by default: unknown fields are dropped
/// silently, and every issue found is reported rather than stopping at the
/// first.
pub trait SchemaContract {
    /// The typed value a successful validation yields.
    type Output;

    /// Check `value` against the expected shape.
    fn validate(&self, value: &Value) -> Result<Self::Output, Vec<ValidationIssue>>;
}
