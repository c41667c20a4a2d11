//! Extraction of a JSON candidate from surrounding prose.
//!
//! Models often wrap their JSON in markdown fences or commentary. These
//! helpers pull out the most plausible candidate before any parsing is
//! attempted.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)```(?:json)?[ \t]*\r?\n?(.*?)```").unwrap());

/// Inner content of the first fenced code block, if any.
///
/// The fence tag is optional and matched case-insensitively; only the first
/// block is used.
pub fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// First balanced `{...}` span in `text`.
///
/// Walks the text with a brace-depth counter and honors string literals and
/// escapes, so a second sibling object is never swallowed into the span and
/// braces inside string values do not confuse the count. Returns `None` when
/// no opening brace exists or the first object never closes.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
