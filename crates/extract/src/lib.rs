//! Plain-text extraction from uploaded documents.
//!
//! Dispatches on the filename suffix (case-insensitive) to the `.txt`,
//! `.docx` and `.pdf` extractors. Unsupported suffixes are a caller mistake
//! and are reported separately from parse failures of supported formats.

mod docx;
mod pdf;
mod txt;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use std::fmt;

use thiserror::Error;

/// Pages of a PDF processed when no explicit limit is given. Shared with the
/// `MAX_PDF_PAGES` config default.
pub use ringkas_core::config::DEFAULT_MAX_PDF_PAGES;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("text is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("DOCX extraction failed: {0}")]
    DocxError(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
}

impl ExtractionError {
    /// True when the input was never a candidate for extraction (bad suffix),
    /// as opposed to a supported file that failed to parse.
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, ExtractionError::UnsupportedType(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Txt,
    Docx,
    Pdf,
}

impl FileType {
    /// Detect the file type from the filename suffix, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".txt") {
            Some(FileType::Txt)
        } else if lower.ends_with(".docx") {
            Some(FileType::Docx)
        } else if lower.ends_with(".pdf") {
            Some(FileType::Pdf)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Docx => "docx",
            FileType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set when a PDF had more pages than the extraction limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTruncation {
    pub processed: usize,
    pub total: usize,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    pub file_type: FileType,
    pub text: String,
    pub truncation: Option<PageTruncation>,
}

impl ExtractedDocument {
    pub fn total_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract text from file bytes, processing at most
/// [`DEFAULT_MAX_PDF_PAGES`] pages of a PDF.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    extract_text_with_limit(bytes, filename, DEFAULT_MAX_PDF_PAGES)
}

/// Extract text from file bytes based on the filename suffix.
pub fn extract_text_with_limit(
    bytes: &[u8],
    filename: &str,
    max_pdf_pages: usize,
) -> Result<ExtractedDocument, ExtractionError> {
    let file_type = FileType::from_filename(filename)
        .ok_or_else(|| ExtractionError::UnsupportedType(suffix_of(filename)))?;

    let (text, truncation) = match file_type {
        FileType::Txt => (txt::extract_txt(bytes)?, None),
        FileType::Docx => (docx::extract_docx(bytes)?, None),
        FileType::Pdf => {
            let pages = pdf::extract_pdf(bytes, max_pdf_pages)?;
            if let Some(t) = pages.truncation {
                tracing::warn!(
                    "PDF '{}' has {} pages, only the first {} were extracted",
                    filename,
                    t.total,
                    t.processed
                );
            }
            (pages.text, pages.truncation)
        }
    };

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        file_type,
        text,
        truncation,
    })
}

fn suffix_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => format!(".{}", ext.to_lowercase()),
        None => filename.to_string(),
    }
}
