//! PDF rendering via `lopdf`: a print-oriented text table.
//!
//! Each row is one line of fixed-width Courier text; every cell is cut to
//! [`MAX_CELL_CHARS`] characters and padded so columns line up. This is a
//! lossy print layout, not a data export. When a page fills up, a new page
//! starts with the header line repeated.

use super::table::Table;
use crate::output::ExtractionResult;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// Cells longer than this are truncated.
pub const MAX_CELL_CHARS: usize = 30;

// A4 landscape, in points.
const PAGE_WIDTH: i64 = 842;
const PAGE_HEIGHT: i64 = 595;
const MARGIN: i64 = 36;
const FONT_SIZE: i64 = 8;
const LEADING: i64 = 11;
const COLUMN_GAP: &str = "  ";

fn lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize
}

pub(crate) fn render(results: &[ExtractionResult]) -> Result<Vec<u8>, String> {
    let rows = Table::from_results(results).text_rows();
    let lines: Vec<String> = rows.iter().map(|r| format_line(r)).collect();
    let pages = paginate(&lines, lines_per_page());
    build_document(&pages).map_err(|e| e.to_string())
}

/// Truncate and pad each cell to a fixed width, then join.
fn format_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| {
            let cut: String = c
                .chars()
                .map(|ch| if ch.is_control() { ' ' } else { ch })
                .take(MAX_CELL_CHARS)
                .collect();
            format!("{cut:<width$}", width = MAX_CELL_CHARS)
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP)
        .trim_end()
        .to_string()
}

/// Split lines into pages, repeating the first line (the header) on each page.
fn paginate(lines: &[String], per_page: usize) -> Vec<Vec<String>> {
    let Some((header, body)) = lines.split_first() else {
        return vec![vec![]];
    };
    if body.is_empty() {
        return vec![vec![header.clone()]];
    }

    let per_page = per_page.max(2);
    body.chunks(per_page - 1)
        .map(|chunk| {
            let mut page = Vec::with_capacity(chunk.len() + 1);
            page.push(header.clone());
            page.extend(chunk.iter().cloned());
            page
        })
        .collect()
}

/// Map text to WinAnsi bytes. Latin-1 maps directly; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn build_document(pages: &[Vec<String>]) -> lopdf::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(line), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}
