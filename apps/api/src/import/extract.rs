//! Text extraction from uploaded résumé documents (PDF or plain text).

use lopdf::Document;
use tracing::{debug, warn};

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";
const UNSUPPORTED: &str = "Unsupported file format. Please upload a PDF or text file.";
const UNREADABLE_PDF: &str =
    "Could not extract text from PDF. Please try a different file format.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub page_count: usize,
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    /// All pages joined by a blank line, trimmed.
    pub fn text(&self) -> String {
        self.pages.join("\n\n").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Text,
    Unknown,
}

fn detect_kind(file_name: &str, content_type: &str, bytes: &[u8]) -> DocumentKind {
    let file_name = file_name.to_lowercase();
    let content_type = content_type.to_lowercase();

    if content_type == "application/pdf"
        || file_name.ends_with(".pdf")
        || bytes.starts_with(PDF_MAGIC)
    {
        DocumentKind::Pdf
    } else if content_type.starts_with("text/")
        || file_name.ends_with(".txt")
        || file_name.ends_with(".md")
    {
        DocumentKind::Text
    } else {
        DocumentKind::Unknown
    }
}

/// Extracts the text of an uploaded document. CPU-bound; call from a blocking task.
pub fn extract_text(
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<ExtractedDocument, AppError> {
    let kind = detect_kind(file_name, content_type, bytes);
    debug!(?kind, file_name, bytes = bytes.len(), "Extracting document text");

    let document = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Text | DocumentKind::Unknown => extract_plain(bytes)?,
    };

    if document.text().is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the document".to_string(),
        ));
    }
    Ok(document)
}

fn extract_plain(bytes: &[u8]) -> Result<ExtractedDocument, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::UnsupportedFormat(UNSUPPORTED.to_string()))?;
    Ok(ExtractedDocument {
        page_count: 1,
        pages: vec![text.to_string()],
    })
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument, AppError> {
    let document = Document::load_mem(bytes).map_err(|e| {
        warn!("PDF could not be loaded: {e}");
        AppError::UnsupportedFormat(UNREADABLE_PDF.to_string())
    })?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in &page_numbers {
        match document.extract_text(&[*page]) {
            Ok(text) => pages.push(text.trim().to_string()),
            Err(e) => {
                warn!(page, "PDF page text extraction failed: {e}");
                pages.push(String::new());
            }
        }
    }

    if pages.iter().all(|page| page.is_empty()) {
        // Some encodings defeat per-page extraction; retry on the whole document.
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!("PDF text extraction failed: {e}");
            AppError::UnsupportedFormat(UNREADABLE_PDF.to_string())
        })?;
        pages = vec![text.trim().to_string()];
    }

    Ok(ExtractedDocument {
        page_count: page_numbers.len().max(1),
        pages,
    })
}
