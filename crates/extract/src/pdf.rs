use lopdf::Document;

use super::{ExtractionError, PageTruncation};

pub struct PdfText {
    pub text: String,
    pub truncation: Option<PageTruncation>,
}

/// Extract the text of the first `max_pages` pages, concatenated in page
/// order with no separator. A page that fails to decode contributes nothing.
pub fn extract_pdf(bytes: &[u8], max_pages: usize) -> Result<PdfText, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = doc.get_pages();
    let total = pages.len();

    let mut text = String::new();
    for &page_number in pages.keys().take(max_pages) {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => tracing::debug!("PDF page {} has no extractable text: {}", page_number, e),
        }
    }

    let truncation = (total > max_pages).then_some(PageTruncation {
        processed: max_pages,
        total,
    });

    Ok(PdfText { text, truncation })
}
