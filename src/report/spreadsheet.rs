//! XLSX rendering via `rust_xlsxwriter`.
//!
//! Same column policy as CSV, on one sheet named [`SHEET_NAME`]. Numbers and
//! booleans keep their cell types so totals can be summed in the spreadsheet;
//! nested values are JSON text exactly as in the CSV output.
//!
//! Lossy in two places: text longer than [`MAX_XLSX_CELL_CHARS`] is cut to
//! fit Excel's cell limit, and integers an `f64` cannot hold exactly are
//! written as text so their digits survive.

use super::table::{cell_text, Table, NO_DATA};
use crate::output::ExtractionResult;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;

pub const SHEET_NAME: &str = "Invoices";

/// Excel's per-cell text limit.
pub const MAX_XLSX_CELL_CHARS: usize = 32_767;

/// Largest integer magnitude an `f64` represents exactly (2^53).
const F64_EXACT_INT: u64 = 1 << 53;

pub(crate) fn render(results: &[ExtractionResult]) -> Result<Vec<u8>, String> {
    build(results).map_err(|e| e.to_string())
}

fn build(results: &[ExtractionResult]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        match Table::from_results(results) {
            Table::NoData => {
                sheet.write_string(0, 0, NO_DATA)?;
            }
            Table::Rows { headers, rows } => {
                for (col, header) in headers.iter().enumerate() {
                    sheet.write_string_with_format(0, col_num(col)?, clip(header), &header_format)?;
                }
                for (i, row) in rows.iter().enumerate() {
                    let row_num = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
                    for (col, value) in row.iter().enumerate() {
                        write_cell(sheet, row_num, col_num(col)?, *value)?;
                    }
                }
            }
        }
    }

    workbook.save_to_buffer()
}

fn col_num(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&Value>,
) -> Result<(), XlsxError> {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) => match exact_f64(n) {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Some(Value::Bool(b)) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Some(other) => {
            sheet.write_string(row, col, clip(&cell_text(Some(other))))?;
        }
    }
    Ok(())
}

/// The number as an `f64`, or `None` for integers beyond 2^53.
fn exact_f64(n: &serde_json::Number) -> Option<f64> {
    if let Some(i) = n.as_i64() {
        return (i.unsigned_abs() <= F64_EXACT_INT).then_some(i as f64);
    }
    if let Some(u) = n.as_u64() {
        return (u <= F64_EXACT_INT).then_some(u as f64);
    }
    n.as_f64()
}

/// Cut `text` to [`MAX_XLSX_CELL_CHARS`] characters.
fn clip(text: &str) -> String {
    match text.char_indices().nth(MAX_XLSX_CELL_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
