//! PDF text extraction. The parser is CPU-bound, so it runs on the blocking pool.

use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("file is not a PDF document")]
    NotPdf,

    #[error("failed to extract text: {0}")]
    Extraction(String),

    #[error("extraction task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Extracts plain text from PDF bytes. A panicking parser surfaces as `PdfError::Task`.
pub async fn extract_text_from_pdf(bytes: Vec<u8>) -> Result<String, PdfError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PdfError::NotPdf);
    }

    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| PdfError::Extraction(e.to_string()))
    })
    .await??;

    debug!(bytes = size, chars = text.len(), "Extracted text from PDF");
    Ok(text)
}
