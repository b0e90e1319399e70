//! CSV rendering.

use super::table::Table;
use crate::output::ExtractionResult;

pub(crate) fn render(results: &[ExtractionResult]) -> Result<Vec<u8>, String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .flexible(false)
        .from_writer(Vec::new());

    for row in Table::from_results(results).text_rows() {
        wtr.write_record(&row).map_err(|e| e.to_string())?;
    }

    wtr.into_inner().map_err(|e| e.to_string())
}
