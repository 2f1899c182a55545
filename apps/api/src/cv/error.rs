use thiserror::Error;

use crate::llm_client::LlmError;

/// Caller-facing message for any stage failure. Causes are logged, never surfaced.
pub const AI_PROCESSING_FAILED: &str = "AI processing failed: Unable to complete CV analysis";
pub const TEXT_REQUIRED: &str = "Text is required";

/// The three model-backed stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Strategy,
    Extraction,
    Enhancement,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Strategy => "strategy",
            Stage::Extraction => "extraction",
            Stage::Enhancement => "enhancement",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure inside a single stage. Always promoted to `PipelineError::AiProcessingFailed`.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage} stage returned a malformed response: {reason}")]
    MalformedResponse { stage: Stage, reason: String },

    #[error("{stage} stage model call failed: {source}")]
    Llm {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("result contains {field} '{value}' which does not appear in the source text")]
    Fabricated { field: &'static str, value: String },
}

impl StageError {
    pub fn malformed(stage: Stage, reason: impl Into<String>) -> Self {
        StageError::MalformedResponse {
            stage,
            reason: reason.into(),
        }
    }
}

/// Pipeline-level failure returned to callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    /// Display is deliberately generic; the cause is reachable only through `source()`.
    #[error("{}", AI_PROCESSING_FAILED)]
    AiProcessingFailed(#[source] StageError),
}

impl PipelineError {
    pub fn text_required() -> Self {
        PipelineError::Validation(TEXT_REQUIRED.to_string())
    }
}
