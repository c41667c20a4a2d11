//! Robust parsing of LLM output into schema-validated values.
//!
//! Model responses are rarely clean JSON: they arrive wrapped in commentary
//! or markdown fences, or as near-JSON with single quotes, bare keys, and
//! trailing commas. [`parser::parse`] extracts a candidate, applies an
//! ordered and logged repair pipeline when direct parsing fails, and
//! validates the result against a caller-supplied
//! [`schema::SchemaContract`]. The repair log makes every rescue auditable,
//! which is what lets prompt problems be found and fixed upstream.
//!
//! Everything here is a pure function of its inputs; nothing is shared
//! across calls, so concurrent requests can parse freely.

pub mod extract;
pub mod parser;
pub mod repair;
pub mod schema;
pub mod schemas;

pub use parser::{parse, ParseConfig, ParseFailure, ParseOutcome};
pub use schema::{PathSegment, SchemaContract, ValidationIssue};
pub use schemas::{
    parse_cover_letter, parse_cv_analysis, CoverLetter, CoverLetterSchema, CvAnalysis,
    CvAnalysisSchema,
};
