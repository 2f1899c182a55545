//! Axum route handlers for the PDF API.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::cv::models::ProcessedCv;
use crate::errors::AppError;
use crate::pdf::html::generate_html;
use crate::state::AppState;

/// POST /apis/pdf/generate
///
/// Renders a structured CV to PDF and returns it as a download.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(cv): Json<ProcessedCv>,
) -> Result<Response, AppError> {
    let html = generate_html(&cv);
    let pdf = state.renderer.render(&html).await?;

    let filename = attachment_filename(&cv.first_name);
    info!(bytes = pdf.len(), %filename, "Generated CV PDF");

    let disposition = HeaderValue::from_str(&format!("attachment; filename={filename}"))
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// `<firstName>-cv.pdf`, restricted to `[A-Za-z0-9_-]`; `untitled` when nothing is left.
fn attachment_filename(first_name: &str) -> String {
    let stem: String = first_name
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let stem = if stem.is_empty() { "untitled" } else { &stem };
    format!("{stem}-cv.pdf")
}
