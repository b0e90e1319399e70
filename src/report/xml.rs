//! Legacy XML export via `quick-xml`.
//!
//! Layout:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <batch id="…" documents="2">
//!   <document index="1">
//!     <field name="invoice_number">INV-1</field>
//!   </document>
//!   <document index="2"/>
//! </batch>
//! ```
//!
//! Documents are numbered from 1. Field values use the same text form as CSV
//! cells, so nested values appear as JSON.

use super::table::cell_text;
use crate::output::ExtractionResult;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub(crate) fn render(results: &[ExtractionResult], batch_id: &str) -> Result<Vec<u8>, String> {
    build(results, batch_id).map_err(|e| e.to_string())
}

fn build(results: &[ExtractionResult], batch_id: &str) -> quick_xml::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let count = results.len().to_string();
    let mut root = BytesStart::new("batch");
    root.push_attribute(("id", batch_id));
    root.push_attribute(("documents", count.as_str()));
    writer.write_event(Event::Start(root))?;

    for (i, result) in results.iter().enumerate() {
        let index = (i + 1).to_string();
        let mut doc = BytesStart::new("document");
        doc.push_attribute(("index", index.as_str()));

        if result.is_empty() {
            writer.write_event(Event::Empty(doc))?;
            continue;
        }

        writer.write_event(Event::Start(doc))?;
        for (name, value) in result {
            let mut field = BytesStart::new("field");
            field.push_attribute(("name", name.as_str()));
            writer.write_event(Event::Start(field))?;
            let text = cell_text(Some(value));
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("field")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("document")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("batch")))?;
    Ok(writer.into_inner())
}
