//! Schema contracts for the documents the application asks the model for:
//! a CV/job-offer analysis and a tailored cover letter draft.
//!
//! Both walk the raw `serde_json::Value` by hand so that every problem is
//! reported with its path, rather than stopping at the first bad field.
//! Unknown fields are dropped silently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parser::{parse, ParseConfig, ParseOutcome};
use crate::schema::{PathSegment, SchemaContract, ValidationIssue};

/// Analysis of a CV against a specific job offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    /// How well the CV matches the offer, 0-100.
    pub match_score: u8,
    /// Existing experience worth emphasizing.
    pub strengths: Vec<String>,
    /// Requirements the CV does not cover.
    pub gaps: Vec<String>,
    /// Concrete rewording/restructuring suggestions.
    pub suggestions: Vec<String>,
    /// One-paragraph overall assessment.
    pub summary: String,
}

/// Cover letter draft tailored to a job offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub greeting: String,
    pub opening: String,
    pub body: Vec<String>,
    pub closing: String,
    pub signature: String,
}

/// Validates the JSON contract for [`CvAnalysis`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CvAnalysisSchema;

impl SchemaContract for CvAnalysisSchema {
    type Output = CvAnalysis;

    fn validate(&self, value: &Value) -> Result<CvAnalysis, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let Some(obj) = value.as_object() else {
            return Err(vec![ValidationIssue::new(vec![], "expected a JSON object")]);
        };

        let match_score = match obj.get("match_score") {
            Some(v) => match v.as_u64() {
                Some(n) if n <= 100 => Some(n as u8),
                Some(n) => {
                    issues.push(ValidationIssue::at_key(
                        "match_score",
                        format!("must be between 0 and 100, got {}", n),
                    ));
                    None
                }
                None => {
                    issues.push(ValidationIssue::at_key("match_score", "expected an integer"));
                    None
                }
            },
            None => {
                issues.push(ValidationIssue::at_key("match_score", "missing required field"));
                None
            }
        };
        let strengths = require_string_array(obj, "strengths", &mut issues);
        let gaps = require_string_array(obj, "gaps", &mut issues);
        let suggestions = require_string_array(obj, "suggestions", &mut issues);
        let summary = require_string(obj, "summary", &mut issues);

        match (match_score, strengths, gaps, suggestions, summary) {
            (Some(match_score), Some(strengths), Some(gaps), Some(suggestions), Some(summary))
                if issues.is_empty() =>
            {
                Ok(CvAnalysis {
                    match_score,
                    strengths,
                    gaps,
                    suggestions,
                    summary,
                })
            }
            _ => Err(issues),
        }
    }
}

/// Validates the JSON contract for [`CoverLetter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverLetterSchema;

impl SchemaContract for CoverLetterSchema {
    type Output = CoverLetter;

    fn validate(&self, value: &Value) -> Result<CoverLetter, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let Some(obj) = value.as_object() else {
            return Err(vec![ValidationIssue::new(vec![], "expected a JSON object")]);
        };

        let greeting = require_string(obj, "greeting", &mut issues);
        let opening = require_string(obj, "opening", &mut issues);
        let body = require_string_array(obj, "body", &mut issues);
        let closing = require_string(obj, "closing", &mut issues);
        let signature = require_string(obj, "signature", &mut issues);

        match (greeting, opening, body, closing, signature) {
            (Some(greeting), Some(opening), Some(body), Some(closing), Some(signature))
                if issues.is_empty() =>
            {
                Ok(CoverLetter {
                    greeting,
                    opening,
                    body,
                    closing,
                    signature,
                })
            }
            _ => Err(issues),
        }
    }
}

fn require_string(
    obj: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::at_key(key, "expected a string"));
            None
        }
        None => {
            issues.push(ValidationIssue::at_key(key, "missing required field"));
            None
        }
    }
}

fn require_string_array(
    obj: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Vec<String>> {
    let items = match obj.get(key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            issues.push(ValidationIssue::at_key(key, "expected an array of strings"));
            return None;
        }
        None => {
            issues.push(ValidationIssue::at_key(key, "missing required field"));
            return None;
        }
    };

    let mut out = Vec::with_capacity(items.len());
    let mut bad = false;
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => out.push(s.to_string()),
            None => {
                issues.push(ValidationIssue::new(
                    vec![PathSegment::Key(key.to_string()), PathSegment::Index(index)],
                    "expected a string",
                ));
                bad = true;
            }
        }
    }

    (!bad).then_some(out)
}

/// Parse a CV/job-offer analysis response.
pub fn parse_cv_analysis(text: &str, config: &ParseConfig) -> ParseOutcome<CvAnalysis> {
    parse(text, &CvAnalysisSchema, config)
}

/// Parse a cover letter draft response.
pub fn parse_cover_letter(text: &str, config: &ParseConfig) -> ParseOutcome<CoverLetter> {
    parse(text, &CoverLetterSchema, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis_value() -> Value {
        json!({
            "match_score": 72,
            "strengths": ["8 years of Rust", "team lead experience"],
            "gaps": ["no Kubernetes exposure"],
            "suggestions": ["mention the migration project first"],
            "summary": "Strong fit overall."
        })
    }

    #[test]
    fn test_cv_analysis_validates() {
        let analysis = CvAnalysisSchema.validate(&analysis_value()).unwrap();
        assert_eq!(analysis.match_score, 72);
        assert_eq!(analysis.strengths.len(), 2);
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let mut value = analysis_value();
        value["model_notes"] = json!("ignore me");
        assert!(CvAnalysisSchema.validate(&value).is_ok());
    }

    #[test]
    fn test_missing_field_reports_path() {
        let mut value = analysis_value();
        value.as_object_mut().unwrap().remove("summary");
        let issues = CvAnalysisSchema.validate(&value).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].to_string(), "summary: missing required field");
    }

    #[test]
    fn test_out_of_range_score_is_rejected() {
        let mut value = analysis_value();
        value["match_score"] = json!(130);
        let issues = CvAnalysisSchema.validate(&value).unwrap_err();
        assert!(issues[0].to_string().contains("0 and 100"));
    }

    #[test]
    fn test_all_issues_are_collected() {
        let issues = CvAnalysisSchema.validate(&json!({})).unwrap_err();
        // One issue per required field.
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn test_bad_array_element_reports_indexed_path() {
        let mut value = analysis_value();
        value["gaps"] = json!(["fine", 42]);
        let issues = CvAnalysisSchema.validate(&value).unwrap_err();
        assert_eq!(issues[0].to_string(), "gaps[1]: expected a string");
    }

    #[test]
    fn test_non_object_is_rejected() {
        let issues = CvAnalysisSchema.validate(&json!([1, 2])).unwrap_err();
        assert_eq!(issues[0].to_string(), "$: expected a JSON object");
    }

    #[test]
    fn test_cover_letter_validates() {
        let value = json!({
            "greeting": "Dear Hiring Manager,",
            "opening": "I am excited to apply.",
            "body": ["First paragraph.", "Second paragraph."],
            "closing": "Thank you for your consideration.",
            "signature": "Jane Doe"
        });
        let letter = CoverLetterSchema.validate(&value).unwrap();
        assert_eq!(letter.body.len(), 2);
    }

    #[test]
    fn test_parse_cv_analysis_end_to_end() {
        let response = r#"```json
{
    "match_score": 64,
    "strengths": ["Vue and TypeScript"],
    "gaps": ["no PDF tooling"],
    "suggestions": ["lead with frontend work"],
    "summary": "Decent fit."
}
```"#;
        let outcome = parse_cv_analysis(response, &ParseConfig::default());
        let analysis = outcome.ok().unwrap();
        assert_eq!(analysis.match_score, 64);
    }

    #[test]
    fn test_parse_cover_letter_repairs_jsonish_response() {
        let response = "Response: {greeting: 'Dear Team,', opening: 'I write to apply.', body: ['One.', 'Two.',], closing: 'Kind regards,', signature: 'J. Doe',}";
        let outcome = parse_cover_letter(response, &ParseConfig::default());
        match outcome {
            ParseOutcome::Success { data, repair_log, .. } => {
                assert_eq!(data.greeting, "Dear Team,");
                assert!(!repair_log.is_empty());
            }
            ParseOutcome::Failure { error, .. } => panic!("should repair: {}", error),
        }
    }
}
