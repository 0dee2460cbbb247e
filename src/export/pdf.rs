//! Minimal PDF 1.4 writer: text only, base-14 Helvetica fonts, A4 pages.
//!
//! Text is encoded with WinAnsiEncoding. Characters outside Latin-1 (and the
//! C1 control range) are written as `?`.

use std::fmt::Write as _;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;
const LINE_SPACING: f32 = 1.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone)]
struct PlacedLine {
    x: f32,
    y: f32,
    size: f32,
    font: Font,
    text: Vec<u8>,
}

/// Flowing text layout that starts a new page when the current one is full
#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    pages: Vec<Vec<PlacedLine>>,
    cursor_y: f32,
}

impl PdfDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Vec::new()],
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a paragraph, wrapped to the page width
    pub fn text(&mut self, text: &str, size: f32, font: Font) -> &mut Self {
        self.indented(text, size, font, 0.0)
    }

    pub fn indented(&mut self, text: &str, size: f32, font: Font, indent: f32) -> &mut Self {
        let width = PAGE_WIDTH - 2.0 * MARGIN - indent;
        for line in wrap(text, max_chars(width, size)) {
            self.place(line, size, font, indent);
        }
        self
    }

    pub fn heading(&mut self, text: &str, size: f32) -> &mut Self {
        self.space(size * 0.4);
        self.text(text, size, Font::Bold)
    }

    /// Vertical gap in points
    pub fn space(&mut self, points: f32) -> &mut Self {
        self.cursor_y -= points;
        self
    }

    fn place(&mut self, line: String, size: f32, font: Font, indent: f32) {
        let advance = size * LINE_SPACING;
        if self.cursor_y - advance < MARGIN {
            self.pages.push(Vec::new());
            self.cursor_y = PAGE_HEIGHT - MARGIN;
        }
        self.cursor_y -= advance;
        let placed = PlacedLine {
            x: MARGIN + indent,
            y: self.cursor_y,
            size,
            font,
            text: encode_text(&line),
        };
        if let Some(page) = self.pages.last_mut() {
            page.push(placed);
        }
    }

    /// Serialize the document with a cross-reference table
    pub fn to_bytes(&self) -> Vec<u8> {
        // Object numbering: 1 catalog, 2 pages, 3-4 fonts, 5 info, then page/content pairs
        const FIRST_PAGE_OBJECT: usize = 6;
        let page_ids: Vec<usize> = (0..self.pages.len())
            .map(|i| FIRST_PAGE_OBJECT + i * 2)
            .collect();

        let mut objects: Vec<Vec<u8>> = Vec::new();
        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects.push(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids,
                self.pages.len()
            )
            .into_bytes(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        let mut info = b"<< /Title (".to_vec();
        info.extend(escape(&encode_text(&self.title)));
        info.extend_from_slice(b") /Producer (WanderPlan) >>");
        objects.push(info);

        for (page, page_id) in self.pages.iter().zip(&page_ids) {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    page_id + 1
                )
                .into_bytes(),
            );

            let content = content_stream(page);
            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend(content);
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend(format!("{} 0 obj\n", i + 1).into_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        );
        out.extend(xref.into_bytes());
        out
    }
}

fn content_stream(lines: &[PlacedLine]) -> Vec<u8> {
    let mut content = Vec::new();
    for line in lines {
        content.extend(
            format!(
                "BT /{} {} Tf {:.2} {:.2} Td (",
                line.font.resource(),
                line.size,
                line.x,
                line.y
            )
            .into_bytes(),
        );
        content.extend(escape(&line.text));
        content.extend_from_slice(b") Tj ET\n");
    }
    content
}

fn max_chars(width: f32, size: f32) -> usize {
    ((width / (size * AVG_GLYPH_WIDTH)) as usize).max(10)
}

/// Greedy word wrap on character counts. Words longer than a line are split.
pub fn wrap(text: &str, max: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let len = current.chars().count();
            if len > 0 && len + 1 + word.len() > max {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Latin-1 bytes; anything else becomes `?`
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Escape the string-literal delimiters
fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn document_has_header_and_trailer() {
        let mut doc = PdfDocument::new("Lisbon");
        doc.text("Hello", 12.0, Font::Regular);
        let bytes = doc.to_bytes();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, b"/BaseFont /Helvetica"));
        assert!(contains(&bytes, b"(Hello) Tj"));
    }

    fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).rposition(|w| w == needle)
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let mut doc = PdfDocument::new("Offsets");
        doc.text("One line", 12.0, Font::Bold);
        let bytes = doc.to_bytes();

        let xref = position(&bytes, b"xref\n0 ").unwrap();
        let tail = String::from_utf8(bytes[xref..].to_vec()).unwrap();
        let first_entry = tail.lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"1 0 obj"));

        let startxref: usize = tail
            .rsplit("startxref\n")
            .next()
            .and_then(|rest| rest.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert_eq!(startxref, xref);
    }

    #[test]
    fn special_characters_are_escaped_or_replaced() {
        assert_eq!(escape(b"a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
        assert_eq!(encode_text("Caf\u{e9} \u{65e5}"), vec![b'C', b'a', b'f', 0xE9, b' ', b'?']);
    }

    #[test]
    fn long_content_spills_onto_new_pages() {
        let mut doc = PdfDocument::new("Long");
        for i in 0..200 {
            doc.text(&format!("Line {}", i), 12.0, Font::Regular);
        }
        assert!(doc.page_count() > 1);
        let bytes = doc.to_bytes();
        let count = format!("/Count {}", doc.page_count());
        assert!(contains(&bytes, count.as_bytes()));
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");

        let lines = wrap("abcdefghijklmnop", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "klmno", "p"]);
    }
}
