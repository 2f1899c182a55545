use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::pdf::render::PdfRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Chat model used by every pipeline stage. Default: `LlmClient`.
    pub llm: Arc<dyn ChatModel>,
    /// Pluggable PDF renderer. Default: `ChromiumRenderer`.
    pub renderer: Arc<dyn PdfRenderer>,
    pub config: Config,
}
