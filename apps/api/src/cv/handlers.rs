//! Axum route handlers for the CV API.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream, StreamExt};
use tracing::info;

use crate::cv::models::ProcessedCv;
use crate::cv::pipeline::process_cv_with_ai;
use crate::cv::progress::{ChannelSink, PipelineEvent, ProgressSink, ProgressUpdate};
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::pdf::extract::{extract_text_from_pdf, PdfError};
use crate::state::AppState;

/// Where the CV for a processing request comes from.
#[derive(Debug)]
enum CvUpload {
    File(Vec<u8>),
    Sample(Vec<u8>),
}

impl CvUpload {
    fn intro(&self) -> &'static str {
        match self {
            CvUpload::File(_) => "Reading uploaded CV...",
            CvUpload::Sample(_) => "Loading sample CV...",
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            CvUpload::File(bytes) | CvUpload::Sample(bytes) => bytes,
        }
    }
}

/// POST /apis/cv/process
///
/// Multipart body: a `cv` PDF file, or `useSample=true`. Streams progress as
/// server-sent events, ending with one `done` event carrying the CV or an error.
pub async fn handle_process_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let upload = read_upload(multipart, &state.config.sample_cv_path).await?;

    let model = Arc::clone(&state.llm);
    Ok(stream_run(move |sink| async move {
        run_upload(model.as_ref(), upload, &sink, extract_text_from_pdf).await
    }))
}

/// Spawns `run` with a fresh sink and streams everything it emits, followed by exactly
/// one terminal event. The stream ends once the run's task has finished.
fn stream_run<F, Fut>(run: F) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: FnOnce(ChannelSink) -> Fut,
    Fut: Future<Output = Result<ProcessedCv, AppError>> + Send + 'static,
{
    let (sink, rx) = ChannelSink::channel();
    let run = run(sink.clone());
    tokio::spawn(async move {
        let terminal = match run.await {
            Ok(cv) => PipelineEvent::Completed(Box::new(cv)),
            Err(e) => {
                let (_, _, message) = e.public_parts();
                PipelineEvent::Failed { message }
            }
        };
        sink.send(terminal);
    });

    let stream = UnboundedReceiverStream::new(rx)
        .map(|event| Ok(Event::default().data(event.to_payload().to_string())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn run_upload<E, Fut>(
    model: &dyn ChatModel,
    upload: CvUpload,
    sink: &ChannelSink,
    extract: E,
) -> Result<ProcessedCv, AppError>
where
    E: FnOnce(Vec<u8>) -> Fut,
    Fut: Future<Output = Result<String, PdfError>>,
{
    sink.emit(ProgressUpdate {
        message: upload.intro().to_string(),
        percentage: 0,
    });
    sink.emit(ProgressUpdate {
        message: "Extracting text from PDF...".to_string(),
        percentage: 2,
    });

    let text = extract(upload.into_bytes()).await?;
    info!(chars = text.len(), "CV text extracted");

    Ok(process_cv_with_ai(model, &text, sink).await?)
}

async fn read_upload(mut multipart: Multipart, sample_path: &str) -> Result<CvUpload, AppError> {
    let mut file = None;
    let mut use_sample = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("cv") => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    file = Some(bytes.to_vec());
                }
            }
            Some("useSample") => {
                let value = field.text().await.map_err(multipart_error)?;
                use_sample = matches!(value.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    if use_sample {
        let bytes = tokio::fs::read(sample_path).await.map_err(|e| {
            tracing::warn!("Sample CV at {sample_path} unavailable: {e}");
            AppError::NotFound("Sample CV is not available".to_string())
        })?;
        return Ok(CvUpload::Sample(bytes));
    }

    file.map(CvUpload::File)
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
