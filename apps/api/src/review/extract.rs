//! Text Extractor: turns an uploaded file into plain resume text.
//!
//! Plain text is decoded as UTF-8. PDFs are walked page by page in document
//! order; every text-showing operator becomes one run, decoded through the
//! encoding of the font selected by the last `Tf`. Runs on a page are joined
//! with a space and pages with a newline. When the walk yields nothing, or a
//! run's font has no encoding lopdf can apply, the whole document is handed
//! to `pdf-extract`.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Encoding, Object, ObjectId};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::debug;

/// `TJ` adjustments below this (thousandths of text space) separate words.
const WORD_GAP: f32 = -200.0;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{0}'")]
    UnsupportedFileType(String),

    #[error("invalid PDF document: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("text file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("text run on page {page} could not be decoded: {source}")]
    RunDecode {
        page: u32,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("text operator '{operator}' on page {page} has no string operand")]
    MissingRunData { page: u32, operator: String },

    #[error("PDF text extraction failed: {0}")]
    Fallback(String),

    #[error("file contains no extractable text")]
    NoText,
}

/// Media types the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
}

impl FileKind {
    /// Classifies a declared media type, ignoring case and parameters.
    pub fn from_media_type(media_type: &str) -> Result<Self, ExtractError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Ok(FileKind::PlainText),
            "application/pdf" => Ok(FileKind::Pdf),
            _ => Err(ExtractError::UnsupportedFileType(media_type.to_string())),
        }
    }
}

/// Extracts text from raw file bytes of the given kind.
///
/// Never returns blank text: an empty result is `ExtractError::NoText`.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match kind {
        FileKind::PlainText => String::from_utf8(bytes.to_vec())?,
        FileKind::Pdf => extract_pdf_text(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

/// A single page: its decoded text runs in content-stream order, and how
/// many runs were dropped because their font could not decode them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfPage {
    pub runs: Vec<String>,
    pub undecodable: usize,
}

/// Loads a PDF and returns its pages in document order.
pub fn read_pdf_pages(bytes: &[u8]) -> Result<Vec<PdfPage>, ExtractError> {
    let doc = Document::load_mem(bytes)?;

    // BTreeMap keyed by page number, so iteration is document order.
    let mut pages = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        pages.push(read_page(&doc, page_number, page_id)?);
    }
    Ok(pages)
}

fn read_page(doc: &Document, page_number: u32, page_id: ObjectId) -> Result<PdfPage, ExtractError> {
    let encodings = page_encodings(doc, page_number, page_id)?;
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut page = PdfPage::default();
    let mut current: Option<&Encoding> = None;
    for operation in &content.operations {
        if operation.operator == "Tf" {
            current = operation
                .operands
                .first()
                .and_then(|name| name.as_name().ok())
                .and_then(|name| encodings.get(name));
            continue;
        }
        let Some(pieces) = run_pieces(page_number, operation)? else {
            continue;
        };
        match decode_run(current, &pieces) {
            Some(text) => {
                let run = percent_decode_str(&text)
                    .decode_utf8()
                    .map_err(|source| ExtractError::RunDecode {
                        page: page_number,
                        source,
                    })?;
                page.runs.push(run.into_owned());
            }
            None => page.undecodable += 1,
        }
    }
    Ok(page)
}

/// Encodings of every font on the page, keyed by resource name. Fonts whose
/// encoding lopdf cannot build are left out; runs shown with them count as
/// undecodable.
fn page_encodings<'a>(
    doc: &'a Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<BTreeMap<Vec<u8>, Encoding<'a>>, ExtractError> {
    let fonts = doc.get_page_fonts(page_id)?;
    Ok(fonts
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                debug!(
                    page = page_number,
                    font = %String::from_utf8_lossy(&name),
                    error = %e,
                    "Font encoding unavailable"
                );
                None
            }
        })
        .collect())
}

/// Joins runs with a space and pages with a newline.
pub fn join_pages(pages: &[PdfPage]) -> String {
    pages
        .iter()
        .map(|page| page.runs.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = read_pdf_pages(bytes)?;
    let text = join_pages(&pages);
    let undecodable: usize = pages.iter().map(|page| page.undecodable).sum();
    if undecodable == 0 && !text.trim().is_empty() {
        return Ok(text);
    }

    debug!(
        pages = pages.len(),
        undecodable,
        "PDF run walk incomplete, falling back to pdf-extract"
    );
    match extract_with_pdf_extract(bytes) {
        Ok(fallback) if !fallback.trim().is_empty() => Ok(fallback),
        // Partial text from the walk beats nothing.
        _ if !text.trim().is_empty() => Ok(text),
        other => other,
    }
}

/// `pdf_extract` can panic on malformed fonts rather than returning an
/// error, so the call is isolated behind `catch_unwind`.
fn extract_with_pdf_extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));
    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Fallback(e.to_string())),
        Err(_) => Err(ExtractError::Fallback(
            "extractor panicked (malformed document)".to_string(),
        )),
    }
}

/// One element of a text-showing operator's operands.
#[derive(Debug, PartialEq)]
enum Piece<'a> {
    Bytes(&'a [u8]),
    WordGap,
}

/// The pieces of a text-showing operator, or `None` for any other operator.
fn run_pieces(page: u32, operation: &Operation) -> Result<Option<Vec<Piece<'_>>>, ExtractError> {
    let missing = || ExtractError::MissingRunData {
        page,
        operator: operation.operator.clone(),
    };

    let pieces = match operation.operator.as_str() {
        "Tj" | "'" => {
            let bytes = operation.operands.first().and_then(string_bytes);
            vec![Piece::Bytes(bytes.ok_or_else(missing)?)]
        }
        // aw ac string
        "\"" => {
            let bytes = operation.operands.get(2).and_then(string_bytes);
            vec![Piece::Bytes(bytes.ok_or_else(missing)?)]
        }
        "TJ" => {
            let items = match operation.operands.first() {
                Some(Object::Array(items)) => items,
                _ => return Err(missing()),
            };
            items
                .iter()
                .filter_map(|item| match string_bytes(item) {
                    Some(bytes) => Some(Piece::Bytes(bytes)),
                    None => match item.as_float() {
                        Ok(adjustment) if adjustment < WORD_GAP => Some(Piece::WordGap),
                        _ => None,
                    },
                })
                .collect()
        }
        _ => return Ok(None),
    };
    Ok(Some(pieces))
}

fn string_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// Decodes a run's strings through the current font encoding. `None` when
/// no font is selected or its encoding cannot decode the bytes.
fn decode_run(encoding: Option<&Encoding>, pieces: &[Piece]) -> Option<String> {
    let mut text = String::new();
    for piece in pieces {
        match piece {
            Piece::Bytes(bytes) => text.push_str(&decode_string(encoding, bytes)?),
            Piece::WordGap => text.push(' '),
        }
    }
    Some(text)
}

fn decode_string(encoding: Option<&Encoding>, bytes: &[u8]) -> Option<String> {
    // Strings carrying a UTF-16BE byte order mark are already Unicode.
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }
    Document::decode_text(encoding?, bytes).ok()
}
