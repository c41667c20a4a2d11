//! Ordered textual repairs for JSON-ish LLM output.
//!
//! Each rule is a pure function returning `Some(rewritten)` only when it
//! changed the text, so the pipeline stays composable and its ordering is an
//! explicit, reviewable list. Ordering matters: quote normalization must run
//! before key quoting because bare keys may be preceded by single-quoted
//! strings that need to become double-quoted first.

use std::sync::LazyLock;

use regex::Regex;

/// A single repair rule: a log label plus the rewrite itself.
pub struct RepairRule {
    /// Human-readable label recorded in the repair log when the rule fires.
    pub label: &'static str,
    /// The rewrite. Returns `None` when the text is left unchanged.
    pub apply: fn(&str) -> Option<String>,
}

/// The repair pipeline, in application order.
pub const REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        label: "stripped leading preamble",
        apply: strip_preamble,
    },
    RepairRule {
        label: "stripped trailing fence or prose",
        apply: strip_trailing,
    },
    RepairRule {
        label: "converted single quotes to double quotes",
        apply: normalize_quotes,
    },
    RepairRule {
        label: "quoted bare object keys",
        apply: quote_bare_keys,
    },
    RepairRule {
        label: "removed trailing commas",
        apply: remove_trailing_commas,
    },
    RepairRule {
        label: "collapsed doubled escaped quotes",
        apply: collapse_double_escapes,
    },
];

/// Run every rule in order, collecting a log entry per rule that fired.
pub fn run_repairs(text: &str) -> (String, Vec<String>) {
    let mut current = text.to_string();
    let mut log = Vec::new();

    for rule in REPAIR_RULES {
        if let Some(rewritten) = (rule.apply)(&current) {
            log.push(rule.label.to_string());
            current = rewritten;
        }
    }

    (current, log)
}

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^(?:\s*(?:here'?s the json response:|the json output is:|json:|response:|```json|```))+\s*"#,
    )
    .unwrap()
});

/// Strip known LLM preambles anchored at the start of the text.
fn strip_preamble(text: &str) -> Option<String> {
    let stripped = PREAMBLE.replace(text, "");
    (stripped != text).then(|| stripped.into_owned())
}

static TRAILING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```\s*$").unwrap());

/// Strip a trailing fence and any prose after a blank line following the
/// JSON region.
fn strip_trailing(text: &str) -> Option<String> {
    let mut out = TRAILING_FENCE.replace(text, "").into_owned();

    let mut search = 0;
    while let Some(found) = out[search..].find("\n\n") {
        let pos = search + found;
        let head = out[..pos].trim_end();
        if head.ends_with(|c| c == '}' || c == ']') {
            out.truncate(pos);
            break;
        }
        search = pos + 2;
    }

    (out != text).then_some(out)
}

/// Convert all single quotes to double quotes.
fn normalize_quotes(text: &str) -> Option<String> {
    text.contains('\'').then(|| text.replace('\'', "\""))
}

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#).unwrap());

/// Wrap identifier-like keys followed by `:` in double quotes.
fn quote_bare_keys(text: &str) -> Option<String> {
    let rewritten = BARE_KEY.replace_all(text, "$1\"$2\":");
    (rewritten != text).then(|| rewritten.into_owned())
}

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Remove commas directly before a closing brace or bracket.
fn remove_trailing_commas(text: &str) -> Option<String> {
    let rewritten = TRAILING_COMMA.replace_all(text, "$1");
    (rewritten != text).then(|| rewritten.into_owned())
}

/// Collapse `\\"` into `\"`.
fn collapse_double_escapes(text: &str) -> Option<String> {
    text.contains(r#"\\""#)
        .then(|| text.replace(r#"\\""#, r#"\""#))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_preamble_variants() {
        assert_eq!(
            strip_preamble("Here's the JSON response: {\"a\": 1}"),
            Some("{\"a\": 1}".to_string())
        );
        assert_eq!(
            strip_preamble("JSON: {\"a\": 1}"),
            Some("{\"a\": 1}".to_string())
        );
        assert_eq!(
            strip_preamble("Response: {\"a\": 1}"),
            Some("{\"a\": 1}".to_string())
        );
        assert_eq!(
            strip_preamble("```json\n{\"a\": 1}"),
            Some("{\"a\": 1}".to_string())
        );
    }

    #[test]
    fn test_strip_preamble_is_anchored() {
        // "response:" mid-text must be left alone.
        assert_eq!(strip_preamble("{\"note\": \"response: later\"}"), None);
    }

    #[test]
    fn test_strip_trailing_fence() {
        assert_eq!(
            strip_trailing("{\"a\": 1}\n```"),
            Some("{\"a\": 1}".to_string())
        );
    }

    #[test]
    fn test_strip_trailing_prose_after_blank_line() {
        assert_eq!(
            strip_trailing("{\"a\": 1}\n\nHope this helps!"),
            Some("{\"a\": 1}".to_string())
        );
    }

    #[test]
    fn test_strip_trailing_keeps_blank_line_inside_prose_prefix() {
        // The blank line is not after a JSON region; nothing to cut.
        assert_eq!(strip_trailing("some prose\n\nmore prose"), None);
    }

    #[test]
    fn test_normalize_quotes() {
        assert_eq!(
            normalize_quotes("{'a': 'b'}"),
            Some("{\"a\": \"b\"}".to_string())
        );
        assert_eq!(normalize_quotes("{\"a\": \"b\"}"), None);
    }

    #[test]
    fn test_quote_bare_keys() {
        assert_eq!(
            quote_bare_keys("{name: \"a\", second_key: 2}"),
            Some("{\"name\": \"a\", \"second_key\": 2}".to_string())
        );
        // Already-quoted keys are untouched.
        assert_eq!(quote_bare_keys("{\"name\": \"a\"}"), None);
    }

    #[test]
    fn test_remove_trailing_commas() {
        assert_eq!(
            remove_trailing_commas("{\"a\": [1, 2,],}"),
            Some("{\"a\": [1, 2]}".to_string())
        );
        assert_eq!(remove_trailing_commas("{\"a\": [1, 2]}"), None);
    }

    #[test]
    fn test_collapse_double_escapes() {
        assert_eq!(
            collapse_double_escapes(r#"{"a": "x\\"y"}"#),
            Some(r#"{"a": "x\"y"}"#.to_string())
        );
        assert_eq!(collapse_double_escapes(r#"{"a": "x\"y"}"#), None);
    }

    #[test]
    fn test_pipeline_order_quotes_before_keys() {
        // Bare keys preceded by single-quoted strings only become quotable
        // after quote normalization.
        let (repaired, log) = run_repairs("{name: 'a', list: ['x','y',],}");
        assert_eq!(repaired, r#"{"name": "a", "list": ["x","y"]}"#);
        let quotes = log
            .iter()
            .position(|l| l.contains("single quotes"))
            .unwrap();
        let keys = log.iter().position(|l| l.contains("bare object keys")).unwrap();
        let commas = log
            .iter()
            .position(|l| l.contains("trailing commas"))
            .unwrap();
        assert!(quotes < keys);
        assert!(keys < commas);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let inputs = [
            "Here's the JSON response: {name: 'a'}\n\nHope this helps!",
            "{'single': 'quotes', trailing: [1,2,],}",
            "```json\n{key: 1}\n```",
        ];
        for input in inputs {
            let (once, first_log) = run_repairs(input);
            let (twice, second_log) = run_repairs(&once);
            assert!(!first_log.is_empty());
            assert_eq!(once, twice, "second pass must not change the text");
            assert!(
                second_log.is_empty(),
                "second pass must not log repairs, got {:?}",
                second_log
            );
        }
    }

    #[test]
    fn test_clean_json_passes_through_untouched() {
        let input = r#"{"a": 1, "b": [true, null]}"#;
        let (out, log) = run_repairs(input);
        assert_eq!(out, input);
        assert!(log.is_empty());
    }
}
