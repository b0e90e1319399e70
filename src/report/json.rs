//! JSON rendering: the result list as-is, pretty-printed.
//!
//! Two-space indentation, each object's own key order, non-ASCII written
//! literally (serde_json never `\u`-escapes it).

use crate::output::ExtractionResult;

pub(crate) fn render(results: &[ExtractionResult]) -> Result<Vec<u8>, String> {
    serde_json::to_vec_pretty(results).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn round_trips_first_element() {
        let result = json!({"invoice_number": "INV-1", "total": 100});
        let results = vec![result.as_object().cloned().unwrap()];
        let bytes = render(&results).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed[0], result);
    }

    #[test]
    fn empty_is_empty_array() {
        assert_eq!(render(&[]).unwrap(), b"[]");
    }

    #[test]
    fn two_space_indent_and_literal_unicode() {
        let results = vec![json!({"vendor": "Café Zürich"}).as_object().cloned().unwrap()];
        let text = String::from_utf8(render(&results).unwrap()).unwrap();
        assert_eq!(text, "[\n  {\n    \"vendor\": \"Café Zürich\"\n  }\n]");
    }

    #[test]
    fn per_object_key_order() {
        let results = vec![
            json!({"b": 1, "a": 2}).as_object().cloned().unwrap(),
            json!({"a": 3, "c": 4}).as_object().cloned().unwrap(),
        ];
        let text = String::from_utf8(render(&results).unwrap()).unwrap();
        assert!(text.find("\"b\"").unwrap() < text.find("\"a\": 2").unwrap());
        assert!(text.find("\"a\": 3").unwrap() < text.find("\"c\"").unwrap());
    }
}
