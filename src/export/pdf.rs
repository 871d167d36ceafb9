//! A minimal PDF 1.4 writer for flat text documents: A4 pages, the
//! base-14 Courier fonts and one uncompressed content stream per
//! page.
use super::glyphs::win_ansi_byte;
use super::transcript::Block;
use super::wrap::{MAX_LINE_CHARS, wrap_line};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 42.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 14.0;
// Courier advances every glyph by 600/1000 em
const GLYPH_ADVANCE: f32 = 0.6;

/// Escapes WinAnsi bytes for a PDF literal string. Anything outside
/// printable ASCII is written as an octal escape so the content
/// stream stays 7-bit.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        let byte = win_ansi_byte(c).unwrap_or(b'?');
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out
}

struct Layout {
    pages: Vec<String>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![String::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page(&mut self) -> &mut String {
        // `pages` always holds at least one page
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(String::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn title(&mut self, title: &str) {
        let width = title.chars().count() as f32 * TITLE_SIZE * GLYPH_ADVANCE;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        let baseline = self.y - TITLE_SIZE;
        let op = format!(
            "BT /F2 {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            TITLE_SIZE,
            x,
            baseline,
            escape_text(title)
        );
        self.page().push_str(&op);
        // Title line plus one blank line
        self.y = baseline - LINE_HEIGHT;
    }

    fn line(&mut self, text: &str) {
        if self.y - BODY_SIZE < MARGIN {
            self.new_page();
        }
        let baseline = self.y - BODY_SIZE;
        let op = format!(
            "BT /F1 {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            BODY_SIZE,
            MARGIN,
            baseline,
            escape_text(text)
        );
        self.page().push_str(&op);
        self.y -= LINE_HEIGHT;
    }

    fn blank(&mut self) {
        // A separator never opens a page
        if !self.at_page_top() {
            self.y -= LINE_HEIGHT;
        }
    }
}

fn layout(title: &str, blocks: &[Block]) -> Vec<String> {
    let mut layout = Layout::new();
    layout.title(title);
    for block in blocks {
        match block {
            Block::Paragraph(text) => {
                for line in wrap_line(text, MAX_LINE_CHARS) {
                    layout.line(&line);
                }
            }
            Block::Separator => layout.blank(),
        }
    }
    layout.pages
}

fn write_document(pages: &[String]) -> Vec<u8> {
    // Object ids: 1 catalog, 2 page tree, 3-4 fonts, then a page and
    // its content stream for each page
    let page_id = |i: usize| 5 + 2 * i;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (i, content) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id(i) + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    out.extend_from_slice(xref.as_bytes());
    out
}

/// Lays out the title and blocks over as many pages as needed and
/// serializes the complete document.
pub fn render(title: &str, blocks: &[Block]) -> Vec<u8> {
    let pages = layout(title, blocks);
    tracing::debug!("Rendering transcript PDF with {} page(s)", pages.len());
    write_document(&pages)
}
