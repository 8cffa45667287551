//! Text extraction: turn an uploaded document into plain text.
//!
//! Dispatch happens once, on the filename's extension, into the closed
//! [`DocumentFormat`] set. Each format maps to exactly one extraction
//! function; everything else is [`DocumentFormat::Unsupported`] and fails.
//!
//! PDF and DOCX parsing is CPU-bound, so [`extract_in_background`] moves the
//! work onto tokio's blocking pool instead of stalling a worker thread.

use crate::error::AnalyzerError;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Raw upload as received from the caller. Owned by a single request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl UploadedDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }
}

/// Supported document formats, selected from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Markdown,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    /// Classify by the lower-cased extension of `filename`.
    pub fn from_filename(filename: &str) -> Self {
        match extension_of(filename).as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "md" => DocumentFormat::Markdown,
            "txt" => DocumentFormat::PlainText,
            _ => DocumentFormat::Unsupported,
        }
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Extract trimmed plain text from `bytes`, dispatching on `filename`.
///
/// An empty result is valid and returned as `Ok("")`; deciding what to do
/// with an empty document is the caller's business.
pub fn extract(bytes: &[u8], filename: &str) -> Result<String, AnalyzerError> {
    let format = DocumentFormat::from_filename(filename);
    info!("Parsing '{}' as {:?} ({} bytes)", filename, format, bytes.len());

    let text = match format {
        DocumentFormat::Pdf => extract_pdf(bytes, filename)?,
        DocumentFormat::Docx => extract_docx(bytes, filename)?,
        DocumentFormat::Markdown | DocumentFormat::PlainText => decode_utf8(bytes, filename)?,
        DocumentFormat::Unsupported => {
            let ext = extension_of(filename);
            warn!("Unsupported file extension '.{}' for file {}", ext, filename);
            return Err(AnalyzerError::UnsupportedFormat {
                filename: filename.to_string(),
                extension: if ext.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{ext}")
                },
            });
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        warn!("Parsing resulted in empty content for file {}", filename);
    } else {
        debug!("Extracted {} chars from {}", trimmed.chars().count(), filename);
    }
    Ok(trimmed.to_string())
}

/// Run [`extract`] on the blocking thread pool.
pub async fn extract_in_background(document: UploadedDocument) -> Result<String, AnalyzerError> {
    tokio::task::spawn_blocking(move || extract(&document.bytes, &document.filename))
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Extraction task panicked: {e}")))?
}

fn decode_utf8(bytes: &[u8], filename: &str) -> Result<String, AnalyzerError> {
    String::from_utf8(bytes.to_vec()).map_err(|source| {
        warn!("Failed to decode {} as UTF-8: {}", filename, source);
        AnalyzerError::InvalidEncoding {
            filename: filename.to_string(),
            source,
        }
    })
}

/// Concatenate the text of every page, one newline after each page that has
/// any text. Image-only pages contribute nothing.
fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String, AnalyzerError> {
    let corrupt = |detail: String| AnalyzerError::CorruptDocument {
        format: "PDF",
        filename: filename.to_string(),
        detail,
    };

    let document = Document::load_mem(bytes).map_err(|e| corrupt(e.to_string()))?;
    let pages = document.get_pages();
    info!("Detected PDF with {} pages", pages.len());

    let mut text = String::new();
    for &page_num in pages.keys() {
        let page_text = document
            .extract_text(&[page_num])
            .map_err(|e| corrupt(format!("page {page_num}: {e}")))?;
        if page_text.trim().is_empty() {
            debug!("Page {} has no extractable text", page_num);
            continue;
        }
        text.push_str(&page_text);
        text.push('\n');
    }
    Ok(text)
}

/// Concatenate the text of every paragraph in `word/document.xml`.
fn extract_docx(bytes: &[u8], filename: &str) -> Result<String, AnalyzerError> {
    let corrupt = |detail: String| AnalyzerError::CorruptDocument {
        format: "DOCX",
        filename: filename.to_string(),
        detail,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| corrupt(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(e.to_string()))?;

    let paragraphs = paragraphs_from_document_xml(&xml).map_err(corrupt)?;
    info!("Detected DOCX document with {} paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

/// Walk WordprocessingML and collect paragraph texts in document order.
///
/// Paragraphs are a stack because text boxes nest `w:p` inside `w:p`.
/// `w:tab`, `w:br` and `w:cr` only count inside a run; the same element
/// names also appear in paragraph properties as tab-stop definitions.
/// Content under `mc:Fallback` is skipped: it repeats the `mc:Choice`
/// branch of the same `mc:AlternateContent` block.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;
    let mut fallback_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Fallback" => fallback_depth += 1,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Fallback" => {
                fallback_depth = fallback_depth.saturating_sub(1)
            }
            Ok(Event::Eof) => break,
            Ok(_) if fallback_depth > 0 => {}
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let current = open.last_mut();
                match (e.local_name().as_ref(), current) {
                    (b"p", _) => paragraphs.push(String::new()),
                    (b"tab", Some(p)) if in_run => p.push('\t'),
                    (b"br" | b"cr", Some(p)) if in_run => p.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if in_text => {
                let s = t.unescape().map_err(|e| e.to_string())?;
                if let Some(p) = open.last_mut() {
                    p.push_str(&s);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p);
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}
