//! Robust JSON extraction from free-text model output.
//!
//! ## Why is a layered extractor necessary?
//!
//! Generative models frequently wrap JSON in prose or code fences, or emit
//! near-miss JSON — smart quotes, trailing commas, a stray byte-order mark —
//! even when the request asks for `application/json`. A single strict parse
//! would reject the majority of otherwise-usable responses.
//!
//! The pipeline below attempts strictly stronger recovery stages in order;
//! the first success wins, and the function never fabricates a value it did
//! not parse from the source text:
//!
//! 1. normalise (BOM, typographic quotes, trailing commas, trim)
//! 2. direct parse
//! 3. fence-stripped parse (leading ` ```json `/` ``` ` and trailing ` ``` `)
//! 4. balanced-slice scan of the fence-stripped text
//! 5. balanced-slice scan of the normalised text (fence stripping can itself
//!    corrupt a boundary)
//! 6. fail with [`ReportError::NotJson`], carrying the raw text
//!
//! Empty input short-circuits to an empty object rather than failing: a
//! model that answers with nothing at all still yields a (blank) report.

use crate::error::ReportError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());
static RE_FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").unwrap());
static RE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

/// Extract a JSON value from raw model output.
///
/// # Errors
/// Returns [`ReportError::NotJson`] (carrying the original text) only when
/// every recovery stage fails. Empty input returns `{}`.
pub fn extract(raw: &str) -> Result<Value, ReportError> {
    let normalised = normalise_candidate(raw);
    if normalised.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    if let Some(value) = try_parse(&normalised) {
        return Ok(value);
    }

    let unfenced = strip_fences(&normalised);
    if let Some(text) = unfenced.as_deref() {
        if !text.is_empty() {
            if let Some(value) = try_parse(text) {
                return Ok(value);
            }
        }
    }

    // Balanced-slice scan, first over the fence-stripped text (prose around
    // the value is the common case) and then over the untouched normalised
    // text in case fence removal chopped a boundary.
    let scan_target = unfenced
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&normalised);
    if let Some(value) = first_parsable_slice(scan_target) {
        return Ok(value);
    }
    if scan_target != normalised {
        if let Some(value) = first_parsable_slice(&normalised) {
            return Ok(value);
        }
    }

    Err(ReportError::NotJson {
        raw: raw.to_string(),
    })
}

/// Cheap character-level cleanup applied before any parse attempt.
///
/// Replaces typographic quotes with their plain equivalents, strips a
/// leading byte-order mark, removes trailing commas immediately before a
/// closing `}`/`]`, and trims surrounding whitespace.
fn normalise_candidate(raw: &str) -> String {
    let without_bom = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);
    let plain_quotes: String = without_bom
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();
    RE_TRAILING_COMMA
        .replace_all(&plain_quotes, "$1")
        .trim()
        .to_string()
}

/// Lenient parse: a bare `null` recovers nothing useful, so it counts as a
/// miss and lets the next stage run.
fn try_parse(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Remove a leading/trailing markdown code fence, returning `None` when the
/// text carried no fence at all.
fn strip_fences(text: &str) -> Option<String> {
    let opened = RE_FENCE_OPEN.replace(text, "");
    let closed = RE_FENCE_CLOSE.replace(&opened, "");
    let stripped = closed.trim();
    if stripped == text {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Scan left-to-right for the first balanced `{…}`/`[…]` slice that parses.
///
/// A slice that balances but fails to parse (or a closer with no matching
/// opener) abandons that start index; the scan then continues from the next
/// opening bracket.
fn first_parsable_slice(input: &str) -> Option<Value> {
    for (idx, ch) in input.char_indices() {
        if ch != '{' && ch != '[' {
            continue;
        }
        if let Some(slice) = balanced_slice(input, idx) {
            if let Some(value) = try_parse(slice) {
                return Some(value);
            }
        }
    }
    None
}

/// Walk forward from `start` (which must sit on `{` or `[`) tracking a
/// bracket stack and string-literal state. Backslash escapes are honoured
/// inside strings so an embedded `\"` does not toggle string state.
///
/// Returns the maximal balanced slice, or `None` when the input is
/// malformed from this start index (mismatched or unmatched closer, or the
/// text ends before the stack empties).
fn balanced_slice(input: &str, start: usize) -> Option<&str> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in input[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let opener = stack.pop()?;
                let matches = (opener == '{' && ch == '}') || (opener == '[' && ch == ']');
                if !matches {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&input[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
