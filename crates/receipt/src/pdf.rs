use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to read PDF: {0}")]
    Load(#[from] lopdf::Error),
    #[error("PDF contains no extractable text")]
    NoText,
}

/// Text of every page, in page order, one page per line block.
///
/// Pages whose text cannot be decoded are skipped with a warning; a document
/// that yields nothing at all is `NoText`.
pub fn extract_text(data: &[u8]) -> Result<String, PdfError> {
    let doc = Document::load_mem(data)?;
    let pages = doc.get_pages();

    let mut parts = Vec::with_capacity(pages.len());
    // BTreeMap keys: already in page-number order.
    for &page in pages.keys() {
        match doc.extract_text(&[page]) {
            Ok(text) => parts.push(text.trim_end().to_string()),
            Err(e) => tracing::warn!(page, "Skipping unreadable PDF page: {e}"),
        }
    }

    let text = parts.join("\n");
    if text.trim().is_empty() {
        return Err(PdfError::NoText);
    }
    Ok(text)
}
