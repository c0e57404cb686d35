//! CSV and PDF snapshots of listings, returned as file downloads.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=UTF-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A generated file sent with `Content-Disposition: attachment`.
#[derive(Debug)]
pub struct FileDownload {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl IntoResponse for FileDownload {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// `customers_20240107_011744.csv`
pub fn timestamped_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}

pub fn csv_bytes<I>(headers: &[&str], rows: I) -> anyhow::Result<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("csv flush failed: {}", err.error()))
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 14;
const TITLE_SIZE: u32 = 16;
const WRAP_AT: usize = 95;
const TITLE_LINES: usize = 3;

/// Plain text-layout PDF: a title, then monospaced-ish rows paginated on A4.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    lines: Vec<String>,
}

impl PdfDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = sanitize(text.as_ref());
        if text.is_empty() {
            self.lines.push(String::new());
        }
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(WRAP_AT) {
            self.lines.push(chunk.iter().collect());
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    fn lines_per_page() -> usize {
        ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize
    }

    fn paginate(&self) -> Vec<&[String]> {
        let per_page = Self::lines_per_page();
        let first = per_page - TITLE_LINES;
        if self.lines.len() <= first {
            return vec![&self.lines[..]];
        }
        let mut pages = vec![&self.lines[..first]];
        pages.extend(self.lines[first..].chunks(per_page));
        pages
    }

    pub fn page_count(&self) -> usize {
        self.paginate().len()
    }

    fn page_stream(&self, index: usize, total: usize, lines: &[String]) -> String {
        let mut stream = String::new();
        let mut top = PAGE_HEIGHT - MARGIN;
        if index == 0 {
            stream.push_str(&format!(
                "BT /F1 {TITLE_SIZE} Tf {MARGIN} {top} Td ({}) Tj ET\n",
                escape(&sanitize(&self.title))
            ));
            top -= TITLE_LINES as u32 * LEADING;
        }
        stream.push_str(&format!(
            "BT /F1 {FONT_SIZE} Tf {LEADING} TL {MARGIN} {top} Td\n"
        ));
        for line in lines {
            stream.push_str(&format!("({}) Tj T*\n", escape(line)));
        }
        stream.push_str("ET\n");
        stream.push_str(&format!(
            "BT /F1 8 Tf {MARGIN} {} Td (Page {} of {total}) Tj ET",
            MARGIN / 2,
            index + 1
        ));
        stream
    }

    pub fn render(&self) -> Vec<u8> {
        let pages = self.paginate();
        let total = pages.len();

        // 1 catalog, 2 page tree, 3 font, then a (page, content) pair per page.
        let kids: Vec<String> = (0..total).map(|i| format!("{} 0 R", 4 + i * 2)).collect();
        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {total} >>",
                kids.join(" ")
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (index, lines) in pages.iter().enumerate() {
            let content_id = 5 + index * 2;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            ));
            let stream = self.page_stream(index, total, lines);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}\nendstream",
                stream.len()
            ));
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", index + 1));
        }
        let xref_at = out.len();
        out.push_str(&format!(
            "xref\n0 {}\n0000000000 65535 f \n",
            objects.len() + 1
        ));
        for offset in offsets {
            out.push_str(&format!("{offset:010} 00000 n \n"));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        out.into_bytes()
    }
}

/// Byte for `c` in the font's WinAnsiEncoding, if it has one.
fn win_ansi(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}

/// Characters the font cannot draw become `?`.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if win_ansi(c).is_some() => c,
            _ => '?',
        })
        .collect()
}

/// PDF string literal body. Non-ASCII goes out as an octal byte escape so the
/// content stream stays 7-bit and `/Length` matches `str::len`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match win_ansi(c) {
            Some(b'\\' | b'(' | b')') => {
                out.push('\\');
                out.push(c);
            }
            Some(byte) if byte.is_ascii() => out.push(c),
            Some(byte) => out.push_str(&format!("\\{byte:03o}")),
            None => out.push('?'),
        }
    }
    out
}

/// Left-aligned fixed-width cell, cut with `~` when too long.
pub fn cell(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    } else {
        format!("{text:<width$}")
    }
}
