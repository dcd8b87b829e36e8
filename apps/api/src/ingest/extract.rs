//! Plain-text extraction per document kind.
//!
//! `pdf` and `docx` support are cargo features. A build without one of them
//! still accepts those uploads but stores a placeholder explaining what is
//! missing instead of failing the request.

use std::path::Path;

use thiserror::Error;

use super::DocumentKind;

#[cfg(not(feature = "pdf"))]
pub const PDF_UNAVAILABLE: &str =
    "PDF processing not available. Rebuild the service with the `pdf` feature enabled.";

#[cfg(not(feature = "docx"))]
pub const WORD_UNAVAILABLE: &str =
    "Word document processing not available. Rebuild the service with the `docx` feature enabled.";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),

    #[error("text file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    #[error("failed to parse Word document: {0}")]
    Word(String),
}

/// Extracts plain text from the file at `path`. Blocking; run it off the runtime.
pub fn extract_text(kind: DocumentKind, path: &Path) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::Txt => Ok(String::from_utf8(std::fs::read(path)?)?),
        DocumentKind::Pdf => extract_pdf(path),
        DocumentKind::Doc | DocumentKind::Docx => extract_word(path),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed font tables
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
        .map_err(|_| ExtractionError::Pdf("parser aborted on malformed document".to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    Ok(pages.concat())
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path) -> Result<String, ExtractionError> {
    tracing::warn!("PDF uploaded but PDF support is not compiled in");
    Ok(PDF_UNAVAILABLE.to_string())
}

#[cfg(feature = "docx")]
fn extract_word(path: &Path) -> Result<String, ExtractionError> {
    use std::io::Read;

    let file = std::fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractionError::Word(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Word(e.to_string()))?
        .read_to_string(&mut xml)?;

    body_paragraphs(&xml)
}

#[cfg(not(feature = "docx"))]
fn extract_word(_path: &Path) -> Result<String, ExtractionError> {
    tracing::warn!("Word document uploaded but docx support is not compiled in");
    Ok(WORD_UNAVAILABLE.to_string())
}

/// Text of every paragraph directly under `w:body`, each followed by `\n`.
/// Paragraphs inside tables and other containers are skipped.
#[cfg(feature = "docx")]
fn body_paragraphs(xml: &str) -> Result<String, ExtractionError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut out = String::new();

    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    // depth of the open top-level paragraph and its text so far
    let mut paragraph: Option<(usize, String)> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Word(e.to_string()))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                match e.name().as_ref() {
                    b"w:body" => body_depth = Some(depth),
                    b"w:p" if paragraph.is_none() && body_depth == Some(depth - 1) => {
                        paragraph = Some((depth, String::new()));
                    }
                    b"w:t" => in_text = true,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let top_level = body_depth == Some(depth);
                match (e.name().as_ref(), paragraph.as_mut()) {
                    (b"w:p", None) if top_level => out.push('\n'),
                    (b"w:tab", Some((_, text))) => text.push('\t'),
                    (b"w:br" | b"w:cr", Some((_, text))) => text.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let (true, Some((_, text))) = (in_text, paragraph.as_mut()) {
                    let unescaped = t.unescape().map_err(|e| ExtractionError::Word(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" if paragraph.as_ref().is_some_and(|(d, _)| *d == depth) => {
                        if let Some((_, text)) = paragraph.take() {
                            out.push_str(&text);
                            out.push('\n');
                        }
                    }
                    b"w:body" => body_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}
