//! Tabular view of heterogeneous extraction results.
//!
//! Column policy: the **first** result's keys, in insertion order, are the
//! columns. Later results are looked up by those keys; missing keys become
//! empty cells and extra keys are dropped. If there is no first result, or
//! it is empty, the table is [`Table::NoData`] and every tabular format
//! renders the single cell [`NO_DATA`].

use crate::output::ExtractionResult;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

/// Placeholder rendered when nothing was extracted.
pub const NO_DATA: &str = "No data extracted";

pub(crate) enum Table<'a> {
    NoData,
    Rows {
        headers: Vec<&'a str>,
        /// One row per result; `None` where the result lacks the column.
        rows: Vec<Vec<Option<&'a Value>>>,
    },
}

impl<'a> Table<'a> {
    pub(crate) fn from_results(results: &'a [ExtractionResult]) -> Self {
        let headers: Vec<&str> = match results.first() {
            Some(first) if !first.is_empty() => first.keys().map(String::as_str).collect(),
            _ => return Table::NoData,
        };

        let rows = results
            .iter()
            .map(|r| headers.iter().map(|h| r.get(*h)).collect())
            .collect();

        Table::Rows { headers, rows }
    }

    /// Every row as display strings, header first.
    pub(crate) fn text_rows(&self) -> Vec<Vec<String>> {
        match self {
            Table::NoData => vec![vec![NO_DATA.to_string()]],
            Table::Rows { headers, rows } => {
                let mut out = Vec::with_capacity(rows.len() + 1);
                out.push(headers.iter().map(|h| h.to_string()).collect());
                out.extend(
                    rows.iter()
                        .map(|row| row.iter().map(|v| cell_text(*v)).collect()),
                );
                out
            }
        }
    }
}

/// Text form of a cell value.
///
/// Strings are written raw, numbers and booleans in JSON spelling, null or
/// missing as empty. Objects and arrays are flattened to compact JSON with
/// `", "` and `": "` separators, e.g. `{"a": 1}`.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(v @ (Value::Array(_) | Value::Object(_))) => spaced_json(v),
    }
}

/// Single-line JSON with a space after each `,` and `:`.
pub fn spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> ExtractionResult {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn nested_values_use_spaced_json() {
        assert_eq!(spaced_json(&json!({"a": 1})), r#"{"a": 1}"#);
        assert_eq!(spaced_json(&json!([1, "x", {"b": [true, null]}])), r#"[1, "x", {"b": [true, null]}]"#);
        assert_eq!(spaced_json(&json!({})), "{}");
        assert_eq!(spaced_json(&json!([])), "[]");
    }

    #[test]
    fn scalar_cells() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(Some(&json!("INV-1"))), "INV-1");
        assert_eq!(cell_text(Some(&json!(100))), "100");
        assert_eq!(cell_text(Some(&json!(12.5))), "12.5");
        assert_eq!(cell_text(Some(&json!(false))), "false");
    }

    #[test]
    fn headers_come_from_first_result() {
        let results = vec![
            obj(json!({"invoice_number": "INV-1", "total": 100})),
            obj(json!({"total": 5, "vendor": "ACME", "items": {"a": 1}})),
        ];
        let rows = Table::from_results(&results).text_rows();
        assert_eq!(rows[0], vec!["invoice_number", "total"]);
        assert_eq!(rows[1], vec!["INV-1", "100"]);
        assert_eq!(rows[2], vec!["", "5"]);
    }

    #[test]
    fn empty_first_result_means_no_data() {
        let results = vec![obj(json!({})), obj(json!({"total": 1}))];
        assert!(matches!(Table::from_results(&results), Table::NoData));
        assert!(matches!(Table::from_results(&[]), Table::NoData));
    }
}
