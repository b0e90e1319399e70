//! Extraction prompts sent alongside each document.
//!
//! Every prompt lives here so the wording can change without touching the
//! request or retry logic in [`crate::pipeline::extract`], and so tests can
//! inspect prompts without a live model.

/// Prompt used when the caller supplies none.
pub const DEFAULT_PROMPT: &str =
    "Extract all invoice fields (invoice number, total, date, etc.) in JSON.";

/// Build the instruction for a batch from the requested field names.
///
/// Names are joined with `", "` in the order given. An empty list still
/// yields a usable (if awkward) prompt; it is not special-cased.
///
/// ```rust
/// use visionparse::prompts::build_prompt;
///
/// let p = build_prompt(&["total".to_string(), "date".to_string()], true);
/// assert!(p.contains("only"));
/// assert!(p.contains("total, date"));
/// ```
pub fn build_prompt(field_names: &[String], strict: bool) -> String {
    let fields = field_names.join(", ");
    if strict {
        format!(
            "Extract only the following fields from this document: {fields}. \
             Do not include any other data. \
             Respond with a single JSON object whose keys are exactly these field names."
        )
    } else {
        format!(
            "Extract the following fields from this document: {fields}. \
             Also extract any other useful data you find. \
             Respond with a single JSON object."
        )
    }
}
