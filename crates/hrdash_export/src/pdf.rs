//! PDF rendering of print documents.
//!
//! Generates minimal but valid PDF files using raw PDF format construction.
//! Long tables are split across A4 pages and the header row is repeated on
//! every page. Uses built-in Helvetica fonts, no external font files required.
//!
//! Text is written in the Windows-1254 (Turkish) byte layout: WinAnsi with
//! the six Turkish letters in place of Eth, Yacute and Thorn. Characters
//! outside that set are printed as `?`.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ExportError, Result};
use crate::print::{PrintDocument, PrintSurface, SurfaceProvider};
use crate::sink::{DownloadSink, ExportFile};

pub const PDF_MIME: &str = "application/pdf";
pub const HTML_MIME: &str = "text/html;charset=utf-8";

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 40.0;
const ROW_HEIGHT: f64 = 18.0;
const CELL_FONT_SIZE: f64 = 9.0;
const CELL_PADDING: f64 = 4.0;

/// Rough Helvetica advance width as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.5;

/// Font encoding shared by both fonts.
const FONT_ENCODING: &str = "<< /Type /Encoding /BaseEncoding /WinAnsiEncoding \
     /Differences [208 /Gbreve 221 /Idotaccent 222 /Scedilla 240 /gbreve 253 /dotlessi 254 /scedilla] >>";

/// Render a print document as a paginated PDF file.
pub fn render_pdf(document: &PrintDocument) -> Vec<u8> {
    let pages = layout_pages(document);
    let mut builder = PdfBuilder::new(&document.title);
    for page in pages {
        builder.add_page(page);
    }
    builder.build()
}

/// Number of pages `render_pdf` will produce for `document`.
pub fn page_count(document: &PrintDocument) -> usize {
    let first = rows_on_page(true);
    let rest = rows_on_page(false);
    if document.rows.len() <= first {
        1
    } else {
        1 + (document.rows.len() - first).div_ceil(rest)
    }
}

fn rows_on_page(first: bool) -> usize {
    // One slot is taken by the repeated header row.
    (((table_top(first) - MARGIN) / ROW_HEIGHT).floor() as usize).saturating_sub(1).max(1)
}

fn table_top(first: bool) -> f64 {
    if first {
        // Title and two metadata lines.
        PAGE_HEIGHT - MARGIN - 70.0
    } else {
        PAGE_HEIGHT - MARGIN
    }
}

fn layout_pages(document: &PrintDocument) -> Vec<String> {
    let mut pages = Vec::new();
    let mut remaining: &[Vec<String>] = &document.rows;
    let mut first = true;

    loop {
        let take = rows_on_page(first).min(remaining.len());
        let (chunk, rest) = remaining.split_at(take);

        let mut content = String::new();
        if first {
            write_heading(&mut content, document);
        }
        write_table(&mut content, &document.headers, chunk, table_top(first));
        pages.push(content);

        remaining = rest;
        first = false;
        if remaining.is_empty() {
            break;
        }
    }

    pages
}

fn write_heading(content: &mut String, document: &PrintDocument) {
    let mut y = PAGE_HEIGHT - MARGIN - 18.0;
    centered_text(content, "/F1", 18.0, y, &document.title);
    y -= 22.0;
    centered_text(
        content,
        "/F2",
        10.0,
        y,
        &format!("Generated: {}", document.generated_at),
    );
    y -= 14.0;
    centered_text(
        content,
        "/F2",
        10.0,
        y,
        &format!("Total records: {}", document.record_count),
    );
}

fn centered_text(content: &mut String, font: &str, size: f64, y: f64, text: &str) {
    let width = text.chars().count() as f64 * size * GLYPH_WIDTH;
    let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
    content.push_str("BT\n");
    content.push_str(&format!("{font} {size:.0} Tf\n"));
    content.push_str(&format!("{x:.0} {y:.0} Td\n"));
    content.push_str(&format!("({}) Tj\n", pdf_text(text)));
    content.push_str("ET\n");
}

fn write_table(content: &mut String, headers: &[String], rows: &[Vec<String>], top: f64) {
    let num_cols = headers.len().max(1);
    let usable_width = PAGE_WIDTH - MARGIN * 2.0;
    let col_width = usable_width / num_cols as f64;
    let max_chars = ((col_width - CELL_PADDING * 2.0) / (CELL_FONT_SIZE * GLYPH_WIDTH))
        .floor()
        .max(1.0) as usize;

    let mut y = top;

    // Header background (light gray)
    content.push_str("0.9 0.9 0.9 rg\n");
    content.push_str(&format!(
        "{MARGIN:.0} {:.0} {usable_width:.0} {ROW_HEIGHT:.0} re f\n",
        y - ROW_HEIGHT
    ));
    content.push_str("0 0 0 rg\n");
    write_cells(content, "/F1", headers, y, col_width, max_chars);
    y -= ROW_HEIGHT;

    for (row_idx, row) in rows.iter().enumerate() {
        if row_idx % 2 == 1 {
            content.push_str("0.97 0.97 0.97 rg\n");
            content.push_str(&format!(
                "{MARGIN:.0} {:.0} {usable_width:.0} {ROW_HEIGHT:.0} re f\n",
                y - ROW_HEIGHT
            ));
            content.push_str("0 0 0 rg\n");
        }
        write_cells(content, "/F2", row, y, col_width, max_chars);
        y -= ROW_HEIGHT;
    }

    // Grid lines
    content.push_str("0.6 0.6 0.6 RG\n");
    content.push_str("0.5 w\n");
    let table_height = top - y;
    content.push_str(&format!(
        "{MARGIN:.0} {y:.0} {usable_width:.0} {table_height:.0} re S\n"
    ));
    let mut line_y = top - ROW_HEIGHT;
    while line_y > y {
        content.push_str(&format!(
            "{MARGIN:.0} {line_y:.0} m {:.0} {line_y:.0} l S\n",
            MARGIN + usable_width
        ));
        line_y -= ROW_HEIGHT;
    }
    for col in 1..num_cols {
        let x = MARGIN + col as f64 * col_width;
        content.push_str(&format!("{x:.1} {y:.0} m {x:.1} {top:.0} l S\n"));
    }
}

fn write_cells(
    content: &mut String,
    font: &str,
    cells: &[String],
    y: f64,
    col_width: f64,
    max_chars: usize,
) {
    for (col_idx, cell) in cells.iter().enumerate() {
        let x = MARGIN + col_idx as f64 * col_width + CELL_PADDING;
        content.push_str("BT\n");
        content.push_str(&format!("{font} {CELL_FONT_SIZE:.0} Tf\n"));
        content.push_str(&format!("{x:.1} {:.0} Td\n", y - ROW_HEIGHT + 5.0));
        content.push_str(&format!("({}) Tj\n", pdf_text(&fit(cell, max_chars))));
        content.push_str("ET\n");
    }
}

/// Truncate to `max_chars`, marking the cut with "..".
fn fit(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let keep = max_chars.saturating_sub(2);
    let mut out: String = flat.chars().take(keep).collect();
    out.push_str("..");
    out
}

/// Encode `s` as a PDF string literal body in the font encoding.
///
/// Bytes outside printable ASCII are written as octal escapes so the content
/// stream stays 7-bit.
fn pdf_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match encode_char(c) {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            byte @ 0x20..=0x7e => out.push(byte as char),
            byte => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out
}

/// Map a character to its Windows-1254 byte, or `?` when it has none.
fn encode_char(c: char) -> u8 {
    let code = c as u32;
    match c {
        '\t' => b' ',
        _ if (0x20..0x7f).contains(&code) => code as u8,
        // Latin-1 slots taken over by the Turkish letters.
        '\u{d0}' | '\u{dd}' | '\u{de}' | '\u{f0}' | '\u{fd}' | '\u{fe}' => b'?',
        _ if (0xa0..=0xff).contains(&code) => code as u8,
        'Ğ' => 0xd0,
        'İ' => 0xdd,
        'Ş' => 0xde,
        'ğ' => 0xf0,
        'ı' => 0xfd,
        'ş' => 0xfe,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'Ÿ' => 0x9f,
        _ => b'?',
    }
}

/// Encode `s` as a UTF-16BE hex string for the document info dictionary.
fn pdf_info_text(s: &str) -> String {
    let mut out = String::from("<FEFF");
    for unit in s.encode_utf16() {
        out.push_str(&format!("{unit:04X}"));
    }
    out.push('>');
    out
}

/// Minimal PDF file builder. Constructs valid PDF 1.4 files.
struct PdfBuilder {
    title: String,
    pages: Vec<String>,
}

impl PdfBuilder {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    fn add_page(&mut self, content: String) {
        self.pages.push(content);
    }

    /// Build the complete PDF file as bytes.
    ///
    /// Object layout: 1 catalog, 2 pages, 3 bold font, 4 regular font,
    /// 5 info, then a (page, content) pair per page.
    fn build(&self) -> Vec<u8> {
        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::new();
        let page_id = |idx: usize| 6 + idx * 2;

        pdf.push_str("%PDF-1.4\n");

        offsets.push(pdf.len());
        pdf.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(pdf.len());
        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", page_id(i)))
            .collect();
        pdf.push_str(&format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            self.pages.len()
        ));

        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding {FONT_ENCODING} >>\nendobj\n"
        ));

        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding {FONT_ENCODING} >>\nendobj\n"
        ));

        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "5 0 obj\n<< /Title {} /Producer (hrdash) >>\nendobj\n",
            pdf_info_text(&self.title)
        ));

        for (idx, content) in self.pages.iter().enumerate() {
            let id = page_id(idx);

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Contents {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n",
                id + 1
            ));

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                id + 1,
                content.len(),
                content
            ));
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1;
        pdf.push_str(&format!("xref\n0 {num_objects}\n"));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }

        pdf.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root 1 0 R /Info 5 0 R >>\n"
        ));
        pdf.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        pdf.into_bytes()
    }
}

// ---------------------------------------------------------------------------
// Print-to-PDF surface
// ---------------------------------------------------------------------------

/// Opens surfaces that "print" by saving the page and a PDF rendering of it.
pub struct PdfSurfaceProvider {
    sink: Arc<dyn DownloadSink>,
}

impl PdfSurfaceProvider {
    pub fn new(sink: Arc<dyn DownloadSink>) -> Self {
        Self { sink }
    }
}

impl SurfaceProvider for PdfSurfaceProvider {
    fn open(&self, document_name: &str) -> Option<Box<dyn PrintSurface>> {
        Some(Box::new(PdfSurface {
            name: document_name.to_string(),
            sink: Arc::clone(&self.sink),
            document: None,
        }))
    }
}

struct PdfSurface {
    name: String,
    sink: Arc<dyn DownloadSink>,
    document: Option<PrintDocument>,
}

impl PrintSurface for PdfSurface {
    fn write(&mut self, document: &PrintDocument) -> Result<()> {
        self.document = Some(document.clone());
        Ok(())
    }

    fn print(&mut self) -> Result<()> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| ExportError::InvalidInput("nothing written to surface".into()))?;

        self.sink.deliver(&ExportFile::new(
            format!("{}.html", self.name),
            HTML_MIME,
            document.to_html().into_bytes(),
        ))?;
        self.sink.deliver(&ExportFile::new(
            format!("{}.pdf", self.name),
            PDF_MIME,
            render_pdf(document),
        ))?;
        debug!("Printed {} to PDF ({} pages)", self.name, page_count(document));
        Ok(())
    }
}
