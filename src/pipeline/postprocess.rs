//! Post-processing: turn a raw `generateContent` response into field data.
//!
//! Models are asked for JSON but answer in prose conventions: the object is
//! usually wrapped in a ```` ```json ```` fence, sometimes a bare ```` ``` ````
//! one, occasionally with stray whitespace around it. These rules peel that
//! off without touching the JSON itself.
//!
//! ## Rule Order
//!
//! 1. Dig out `candidates[0].content.parts[0].text`
//! 2. Trim, then strip fence markers at line starts/ends, then trim again
//! 3. Parse as JSON; anything but an object is rejected

use crate::error::DocumentError;
use crate::output::ExtractionResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Answer returned when the response carries nothing usable.
pub const EMPTY_JSON: &str = "{}";

// ── Rule 1: Locate the answer text ───────────────────────────────────────────

/// Pull the first candidate's first text part out of a response body.
pub fn candidate_text(body: &str) -> Result<String, DocumentError> {
    let value: Value = serde_json::from_str(body).map_err(|e| DocumentError::MalformedResponse {
        detail: format!("body is not JSON: {e}"),
    })?;

    value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DocumentError::MalformedResponse {
            detail: "missing candidates[0].content.parts[0].text".into(),
        })
}

// ── Rule 2: Strip code fences ────────────────────────────────────────────────

static RE_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```json\s*|^```\s*|```$").expect("fence regex is valid"));

/// Remove ```` ```json ```` / ```` ``` ```` fence markers and surrounding whitespace.
pub fn strip_json_fences(text: &str) -> String {
    RE_FENCES.replace_all(text.trim(), "").trim().to_string()
}

/// Rules 1 + 2: the cleaned answer text of a 200 response.
pub fn clean_response(body: &str) -> Result<String, DocumentError> {
    candidate_text(body).map(|t| strip_json_fences(&t))
}

// ── Rule 3: Parse fields ─────────────────────────────────────────────────────

/// Parse cleaned model output into an ordered field map.
pub fn parse_fields(text: &str) -> Result<ExtractionResult, DocumentError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DocumentError::InvalidJson {
            detail: format!("expected an object, got {}", json_kind(&other)),
        }),
        Err(e) => Err(DocumentError::InvalidJson {
            detail: e.to_string(),
        }),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
