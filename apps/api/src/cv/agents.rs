//! The three model-backed stages. Each issues exactly one chat call and parses the
//! JSON reply; no retries happen here (the adapter owns those).

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cv::error::{Stage, StageError};
use crate::cv::models::{ProcessedCv, RawCvText, StrategyAssessment};
use crate::cv::prompts::{
    ENHANCEMENT_PROMPT_TEMPLATE, ENHANCEMENT_SYSTEM, EXTRACTION_PROMPT_TEMPLATE,
    EXTRACTION_SYSTEM, STRATEGY_PROMPT_TEMPLATE, STRATEGY_SYSTEM,
};
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{strip_json_fences, ChatMessage, ChatModel, ChatRequest};

pub const REQUIRED_STRATEGY_FIELDS: &[&str] = &[
    "contentQuality",
    "primaryFocus",
    "processingPriorities",
    "potentialChallenges",
];

pub const REQUIRED_CV_FIELDS: &[&str] = &["firstName", "objective", "skills", "experience"];

/// Stage 1: judge the CV's quality and what processing it needs.
pub async fn run_strategy_agent(
    model: &dyn ChatModel,
    text: &RawCvText,
) -> Result<StrategyAssessment, StageError> {
    let prompt = STRATEGY_PROMPT_TEMPLATE.replace("{cv_text}", text.as_str());
    let reply = call_stage(
        model,
        Stage::Strategy,
        system_prompt(STRATEGY_SYSTEM, false),
        prompt,
    )
    .await?;
    parse_stage_json(Stage::Strategy, &reply, REQUIRED_STRATEGY_FIELDS)
}

/// Stage 2: structured extraction under the non-fabrication and PII rules.
pub async fn run_extraction_agent(
    model: &dyn ChatModel,
    text: &RawCvText,
) -> Result<ProcessedCv, StageError> {
    let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{cv_text}", text.as_str());
    let reply = call_stage(
        model,
        Stage::Extraction,
        system_prompt(EXTRACTION_SYSTEM, true),
        prompt,
    )
    .await?;
    parse_stage_json(Stage::Extraction, &reply, REQUIRED_CV_FIELDS)
}

/// Stage 3: regroup skills into 4-6 categories, leaving everything else alone.
pub async fn run_enhancement_agent(
    model: &dyn ChatModel,
    draft: &ProcessedCv,
) -> Result<ProcessedCv, StageError> {
    let cv_json = serde_json::to_string(draft).map_err(|e| {
        StageError::malformed(Stage::Enhancement, format!("could not serialize draft: {e}"))
    })?;
    let prompt = ENHANCEMENT_PROMPT_TEMPLATE.replace("{cv_json}", &cv_json);
    let reply = call_stage(
        model,
        Stage::Enhancement,
        system_prompt(ENHANCEMENT_SYSTEM, true),
        prompt,
    )
    .await?;
    parse_stage_json(Stage::Enhancement, &reply, REQUIRED_CV_FIELDS)
}

async fn call_stage(
    model: &dyn ChatModel,
    stage: Stage,
    system: String,
    prompt: String,
) -> Result<String, StageError> {
    let request = ChatRequest::json(vec![ChatMessage::system(system), ChatMessage::user(prompt)]);
    model
        .complete(request)
        .await
        .map_err(|source| StageError::Llm { stage, source })
}

/// Parses a stage reply: must be a JSON object carrying every required key.
fn parse_stage_json<T: DeserializeOwned>(
    stage: Stage,
    reply: &str,
    required: &[&str],
) -> Result<T, StageError> {
    let value: Value = serde_json::from_str(strip_json_fences(reply))
        .map_err(|e| StageError::malformed(stage, format!("invalid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| StageError::malformed(stage, "expected a JSON object"))?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(StageError::malformed(
            stage,
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| StageError::malformed(stage, format!("unexpected shape: {e}")))
}
