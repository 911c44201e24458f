//! Verdict extraction from the LLM reply text.
//!
//! Replies are expected to be a single JSON object, but models
//! occasionally wrap it in a Markdown code fence or add a sentence of
//! preamble. Extraction takes the outermost `{ … }` span; anything that
//! still fails the schema is an `OracleError::Parse`.

use crate::error::{OracleError, OracleResult};
use tradesmart_core::Verdict;

/// Parse the verdict object out of raw reply text.
pub fn parse_verdict(text: &str) -> OracleResult<Verdict> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(OracleError::Empty);
    }

    let body = strip_code_fence(trimmed);
    let object = extract_object_span(body)
        .ok_or_else(|| OracleError::Parse("no JSON object in reply".to_string()))?;

    serde_json::from_str::<Verdict>(object)
        .map_err(|e| OracleError::Parse(format!("verdict schema violation: {e}")))
}

/// Strip a leading/trailing Markdown code fence, with or without a
/// language tag.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, if any
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Outermost `{ … }` span: first opening brace to last closing brace.
fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
