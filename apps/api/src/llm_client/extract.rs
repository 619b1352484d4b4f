//! Text extraction from `generateContent` responses.
//!
//! The two Google backends do not agree on where the useful text lives, so each
//! backend carries an ordered list of extractors and the first non-empty hit wins.

use serde_json::Value;

pub type Extractor = fn(&Value) -> Option<String>;

/// Returned when no extractor yields text.
pub const EMPTY_JSON: &str = "{}";

/// Vertex: the nested candidate structure is authoritative.
pub const VERTEX_EXTRACTORS: &[Extractor] = &[first_candidate_part, response_text];

/// AI Studio: prefer the flattened accessor form.
pub const STUDIO_EXTRACTORS: &[Extractor] = &[response_text, first_candidate_part];

/// `candidates[0].content.parts[0].text`
pub fn first_candidate_part(response: &Value) -> Option<String> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Accessor form: a top-level `text` field, or every text part of the first
/// candidate concatenated in order.
pub fn response_text(response: &Value) -> Option<String> {
    if let Some(text) = response.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)?;
    let joined: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Some(joined)
}

pub fn extract_text(response: &Value, extractors: &[Extractor]) -> String {
    extractors
        .iter()
        .find_map(|extract| extract(response).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| EMPTY_JSON.to_string())
}
