//! PDF rendering — pluggable, trait-based.
//!
//! Default: `ChromiumRenderer`, which prints the HTML from `pdf::html` with a headless
//! Chromium. `AppState` holds an `Arc<dyn PdfRenderer>`.

use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser exited with {status}: {stderr}")]
    BrowserFailed { status: String, stderr: String },

    #[error("browser produced an empty PDF")]
    EmptyOutput,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Prints HTML to PDF with `<binary> --headless --print-to-pdf`.
/// Page size and margins come from the document's `@page` rule.
pub struct ChromiumRenderer {
    binary: String,
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(html_url: &str, output: &str) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--no-pdf-header-footer".to_string(),
            format!("--print-to-pdf={output}"),
            html_url.to_string(),
        ]
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        // Dropped (and deleted) when this call returns.
        let workdir = tempfile::tempdir()?;
        let html_path = workdir.path().join("cv.html");
        let pdf_path = workdir.path().join("cv.pdf");
        tokio::fs::write(&html_path, html).await?;

        let html_url = format!("file://{}", html_path.display());
        let output = Command::new(&self.binary)
            .args(Self::args(&html_url, &pdf_path.display().to_string()))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(RenderError::BrowserFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pdf = tokio::fs::read(&pdf_path).await?;
        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        debug!(bytes = pdf.len(), "Rendered PDF");
        Ok(pdf)
    }
}
