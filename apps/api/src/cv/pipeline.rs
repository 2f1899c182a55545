//! CV Pipeline — orchestrates strategy analysis, extraction and conditional enhancement.
//!
//! Flow: Validating → Strategy → Extraction → {Enhancement | SkipEnhancement} → Done.
//! Any stage error ends the run as `PipelineError::AiProcessingFailed`; no partial
//! result is ever returned and nothing is retried at this level.
//!
//! Progress percentages are fixed checkpoints (see `progress::checkpoint`), so callers
//! see the same sequence for every run that takes the same branch.

use std::time::Instant;

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::cv::agents::{run_enhancement_agent, run_extraction_agent, run_strategy_agent};
use crate::cv::error::{PipelineError, StageError};
use crate::cv::models::{ContentQuality, ProcessedCv, RawCvText, StrategyAssessment};
use crate::cv::progress::{checkpoint, ProgressReporter, ProgressSink};
use crate::cv::verifier::{scrub_contact_details, verify_grounded};
use crate::llm_client::ChatModel;

/// Enhancement runs iff the strategy stage did not judge the CV high quality, or it
/// anticipated any challenge. This is the pipeline's only branch point.
pub fn should_enhance(strategy: &StrategyAssessment) -> bool {
    strategy.content_quality != ContentQuality::High || !strategy.potential_challenges.is_empty()
}

/// Pipeline states. `Failed` is the `Err` arm of each transition.
#[derive(Debug)]
enum Phase {
    Strategy(RawCvText),
    Extraction {
        text: RawCvText,
        strategy: StrategyAssessment,
    },
    Enhancement {
        text: RawCvText,
        strategy: StrategyAssessment,
        draft: ProcessedCv,
    },
    SkipEnhancement {
        text: RawCvText,
        draft: ProcessedCv,
    },
    Done(ProcessedCv),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Strategy(_) => "strategy",
            Phase::Extraction { .. } => "extraction",
            Phase::Enhancement { .. } => "enhancement",
            Phase::SkipEnhancement { .. } => "skip_enhancement",
            Phase::Done(_) => "done",
        }
    }
}

/// Runs the full pipeline on raw CV text.
///
/// Blank text fails with `PipelineError::Validation("Text is required")` before any
/// progress event or model call.
pub async fn process_cv_with_ai(
    model: &dyn ChatModel,
    text: &str,
    sink: &dyn ProgressSink,
) -> Result<ProcessedCv, PipelineError> {
    let text = RawCvText::new(text)?;
    let run_id = Uuid::new_v4();

    let span = info_span!("cv_pipeline", %run_id);
    let mut runner = Runner {
        model,
        reporter: ProgressReporter::new(sink),
    };
    runner.run(text).instrument(span).await
}

struct Runner<'a> {
    model: &'a dyn ChatModel,
    reporter: ProgressReporter<'a>,
}

impl<'a> Runner<'a> {
    async fn run(&mut self, text: RawCvText) -> Result<ProcessedCv, PipelineError> {
        let started = Instant::now();
        self.reporter
            .report("Initializing AI CV Analysis Agent...", checkpoint::INITIALIZING);

        let mut phase = Phase::Strategy(text);
        loop {
            let current = phase.name();
            phase = match self.step(phase).await {
                Ok(Phase::Done(cv)) => {
                    info!(
                        "Total processing time: {:.2}s",
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(cv);
                }
                Ok(next) => next,
                Err(cause) => {
                    error!(phase = current, "Error in AI processing: {cause}");
                    return Err(PipelineError::AiProcessingFailed(cause));
                }
            };
        }
    }

    async fn step(&mut self, phase: Phase) -> Result<Phase, StageError> {
        match phase {
            Phase::Strategy(text) => {
                let strategy = self.strategy_phase(&text).await?;
                Ok(Phase::Extraction { text, strategy })
            }
            Phase::Extraction { text, strategy } => {
                let draft = self.extraction_phase(&text).await?;
                if should_enhance(&strategy) {
                    Ok(Phase::Enhancement {
                        text,
                        strategy,
                        draft,
                    })
                } else {
                    Ok(Phase::SkipEnhancement { text, draft })
                }
            }
            Phase::Enhancement {
                text,
                strategy,
                draft,
            } => {
                let enhanced = self.enhancement_phase(&strategy, &draft).await?;
                finish(&text, enhanced).map(Phase::Done)
            }
            Phase::SkipEnhancement { text, draft } => {
                self.reporter.report(
                    "AI Processing Complete: Preparing final CV output...",
                    checkpoint::FINAL,
                );
                finish(&text, draft).map(Phase::Done)
            }
            Phase::Done(cv) => Ok(Phase::Done(cv)),
        }
    }

    async fn strategy_phase(&mut self, text: &RawCvText) -> Result<StrategyAssessment, StageError> {
        self.reporter.report(
            "AI Strategy Agent: Analyzing CV structure and determining optimal processing approach...",
            checkpoint::STRATEGY_STRUCTURE,
        );
        self.reporter.report(
            "AI Strategy Agent: Evaluating content quality and identifying key areas for focus...",
            checkpoint::STRATEGY_QUALITY,
        );

        let started = Instant::now();
        let strategy = run_strategy_agent(self.model, text).await?;
        info!(
            "Strategy analysis completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        self.reporter.report(
            format!(
                "AI Strategy Agent: Analysis complete - Detected {} quality content",
                strategy.content_quality
            ),
            checkpoint::STRATEGY_DONE,
        );
        self.reporter.report(
            format!(
                "AI Strategy Agent: Identified key focus areas: {}",
                strategy.primary_focus.join(", ")
            ),
            checkpoint::STRATEGY_FOCUS,
        );
        self.reporter.report(
            format!(
                "AI Strategy Agent: Processing priorities set: {}",
                strategy.processing_priorities.join(" → ")
            ),
            checkpoint::STRATEGY_PRIORITIES,
        );
        Ok(strategy)
    }

    async fn extraction_phase(&mut self, text: &RawCvText) -> Result<ProcessedCv, StageError> {
        self.reporter.report(
            "AI Processing Agent: Beginning structured information extraction...",
            checkpoint::EXTRACTION_START,
        );
        self.reporter.report(
            "AI Processing Agent: Identifying and categorizing skills...",
            checkpoint::EXTRACTION_SKILLS,
        );
        self.reporter.report(
            "AI Processing Agent: Analyzing work experience and responsibilities...",
            checkpoint::EXTRACTION_EXPERIENCE,
        );

        let started = Instant::now();
        let draft = run_extraction_agent(self.model, text).await?;
        info!(
            "Main processing completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        self.reporter.report(
            "AI Processing Agent: Initial CV structure complete",
            checkpoint::EXTRACTION_DONE,
        );
        Ok(draft)
    }

    async fn enhancement_phase(
        &mut self,
        strategy: &StrategyAssessment,
        draft: &ProcessedCv,
    ) -> Result<ProcessedCv, StageError> {
        self.reporter.report(
            "AI Enhancement Agent: Starting CV optimization process...",
            checkpoint::ENHANCEMENT_START,
        );
        self.reporter.report(
            format!(
                "AI Enhancement Agent: Addressing identified challenges: {}",
                strategy.potential_challenges.join(", ")
            ),
            checkpoint::ENHANCEMENT_CHALLENGES,
        );
        self.reporter.report(
            "AI Enhancement Agent: Reorganizing skills into logical categories...",
            checkpoint::ENHANCEMENT_SKILLS,
        );
        self.reporter.report(
            "AI Enhancement Agent: Optimizing content structure and clarity...",
            checkpoint::ENHANCEMENT_STRUCTURE,
        );

        let started = Instant::now();
        let enhanced = run_enhancement_agent(self.model, draft).await?;
        info!(
            "Enhancement completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        self.reporter.report(
            "AI Enhancement Agent: Finalizing improvements...",
            checkpoint::ENHANCEMENT_FINALIZING,
        );
        self.reporter.report(
            "AI Enhancement Agent: Optimization complete - Preparing final output...",
            checkpoint::FINAL,
        );
        Ok(enhanced)
    }
}

/// Runtime guards applied to whichever result becomes final.
fn finish(text: &RawCvText, mut cv: ProcessedCv) -> Result<ProcessedCv, StageError> {
    verify_grounded(text, &cv)?;
    let scrubbed = scrub_contact_details(text, &mut cv);
    if !scrubbed.is_empty() {
        tracing::warn!(
            count = scrubbed.len(),
            "Removed contact details the model left in the output"
        );
    }
    Ok(cv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::error::{Stage, AI_PROCESSING_FAILED};
    use crate::cv::progress::testing::RecordingSink;
    use crate::cv::progress::NoopSink;
    use crate::llm_client::mock::{MockChatModel, MockResponse};
    use serde_json::{json, Value};
    use std::error::Error as _;

    const SAMPLE_CV: &str = "CAREER OBJECTIVE
Qualified and licensed electrician, available for an immediate start.

KEY SKILLS
• Operating hand and power tools
• Stock control
• Ability to multitask

Electrical skills
• General service work (domestic, commercial and industrial)
• Lighting
• Fault finding

John Test

WORK HISTORY
ZMS Electrical | Electrician 2022-2023
● General Electrical work
● Commercial Solar works

Test Aged Care | Maintenance Manager   2018-2022
● Organise all reactive and preventive maintenance issues.
● Quality customer service for residents

TST Electrical | Electrician      2016-2018
● Government testing contracts

Top Test Electrical Contractors | Electrician   2007-2016
● Woodford prison maintenance

REFERENCES
Harvey - Director, HJ Recruitment";

    fn strategy(quality: &str, challenges: &[&str]) -> Value {
        json!({
            "contentQuality": quality,
            "primaryFocus": ["skills categorization", "work history"],
            "processingPriorities": ["extract experience", "group skills"],
            "potentialChallenges": challenges,
        })
    }

    fn extraction() -> Value {
        json!({
            "firstName": "John",
            "objective": "Qualified and licensed electrician, available for an immediate start.",
            "skills": {
                "Electrical Skills": "General service work (domestic, commercial and industrial), Lighting, Fault finding",
                "General Skills": "Operating hand and power tools, Stock control, Ability to multitask"
            },
            "experience": [
                {"company": "ZMS Electrical", "position": "Electrician", "period": "2022-2023",
                 "responsibilities": ["General Electrical work", "Commercial Solar works"]},
                {"company": "Test Aged Care", "position": "Maintenance Manager", "period": "2018-2022",
                 "responsibilities": ["Organise maintenance", "Customer service"]},
                {"company": "TST Electrical", "position": "Electrician", "period": "2016-2018",
                 "responsibilities": ["Government contracts"]},
                {"company": "Top Test Electrical", "position": "Electrician", "period": "2007-2016",
                 "responsibilities": ["Prison maintenance"]}
            ],
            "formattingNotes": ["Removed reference section"],
            "piiRemoved": ["Test", "Harvey"]
        })
    }

    fn enhanced() -> Value {
        let mut value = extraction();
        value["skills"] = json!({
            "Electrical Services": "General service work (domestic, commercial and industrial), Fault finding",
            "Lighting": "Lighting",
            "Tools & Equipment": "Operating hand and power tools",
            "Operations": "Stock control, Ability to multitask"
        });
        value
    }

    #[test]
    fn test_should_enhance_predicate() {
        let build = |quality, challenges: Vec<&str>| StrategyAssessment {
            content_quality: quality,
            primary_focus: vec![],
            processing_priorities: vec![],
            potential_challenges: challenges.into_iter().map(String::from).collect(),
        };
        assert!(!should_enhance(&build(ContentQuality::High, vec![])));
        assert!(should_enhance(&build(ContentQuality::High, vec!["dates"])));
        assert!(should_enhance(&build(ContentQuality::Medium, vec![])));
        assert!(should_enhance(&build(ContentQuality::Low, vec![])));
        assert!(should_enhance(&build(ContentQuality::Low, vec!["ambiguous dates"])));
    }

    #[tokio::test]
    async fn test_blank_input_fails_before_any_call_or_event() {
        for input in ["", "   ", "\n\t"] {
            let model = MockChatModel::new();
            let sink = RecordingSink::default();
            let err = process_cv_with_ai(&model, input, &sink).await.unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)));
            assert!(err.to_string().contains("Text is required"));
            assert_eq!(model.call_count(), 0);
            assert!(sink.updates().is_empty());
        }
    }

    #[tokio::test]
    async fn test_high_quality_without_challenges_skips_enhancement() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("high", &[])),
            MockResponse::json(extraction()),
        ]);
        let sink = RecordingSink::default();

        let cv = process_cv_with_ai(&model, SAMPLE_CV, &sink).await.unwrap();

        assert_eq!(model.call_count(), 2);
        assert_eq!(
            sink.percentages(),
            vec![5, 15, 20, 25, 30, 35, 40, 45, 50, 60, 95]
        );
        assert_eq!(cv.skills.len(), 2);
        assert!(cv.skills.contains_key("Electrical Skills"));
    }

    #[tokio::test]
    async fn test_low_quality_with_challenges_runs_enhancement_once() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("low", &["ambiguous dates"])),
            MockResponse::json(extraction()),
            MockResponse::json(enhanced()),
        ]);
        let sink = RecordingSink::default();

        let cv = process_cv_with_ai(&model, SAMPLE_CV, &sink).await.unwrap();

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.remaining_responses(), 0);
        assert_eq!(
            sink.percentages(),
            vec![5, 15, 20, 25, 30, 35, 40, 45, 50, 60, 70, 75, 80, 85, 90, 95]
        );
        assert_eq!(cv.skills.len(), 4);
        assert!(cv.skills.contains_key("Electrical Services"));

        let updates = sink.updates();
        assert!(updates[3].message.contains("Detected low quality content"));
        assert!(updates[5]
            .message
            .contains("extract experience → group skills"));
        assert!(updates[11].message.contains("ambiguous dates"));
    }

    #[tokio::test]
    async fn test_high_quality_with_challenges_still_enhances() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("high", &["mixed bullet styles"])),
            MockResponse::json(extraction()),
            MockResponse::json(enhanced()),
        ]);
        process_cv_with_ai(&model, SAMPLE_CV, &NoopSink).await.unwrap();
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_full_cv_extracts_expected_entries() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("medium", &[])),
            MockResponse::json(extraction()),
            MockResponse::json(enhanced()),
        ]);
        let cv = process_cv_with_ai(&model, SAMPLE_CV, &NoopSink)
            .await
            .unwrap();

        assert_eq!(cv.first_name, "John");
        assert_eq!(cv.experience.len(), 4);
        let zms = cv
            .experience
            .iter()
            .find(|e| e.company == "ZMS Electrical")
            .unwrap();
        assert_eq!(zms.position, "Electrician");
        assert_eq!(zms.period, "2022-2023");

        let pii = cv.pii_removed.unwrap();
        assert!(pii.contains(&"Test".to_string()));
        assert!(pii.contains(&"Harvey".to_string()));

        for entry in &cv.experience {
            assert!(SAMPLE_CV
                .to_lowercase()
                .contains(&entry.company.to_lowercase()));
        }
    }

    #[tokio::test]
    async fn test_non_json_strategy_reply_fails_whole_run() {
        let model = MockChatModel::with_responses([MockResponse::text(
            "I'm sorry, I can't help with that.",
        )]);
        let sink = RecordingSink::default();

        let err = process_cv_with_ai(&model, SAMPLE_CV, &sink)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), AI_PROCESSING_FAILED);
        assert!(matches!(
            err.source().and_then(|s| s.downcast_ref::<StageError>()),
            Some(StageError::MalformedResponse {
                stage: Stage::Strategy,
                ..
            })
        ));
        assert_eq!(model.call_count(), 1);
        assert_eq!(sink.percentages(), vec![5, 15, 20]);
    }

    #[tokio::test]
    async fn test_enhancement_failure_discards_extraction_result() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("low", &[])),
            MockResponse::json(extraction()),
            MockResponse::text("{not json"),
        ]);
        let sink = RecordingSink::default();

        let err = process_cv_with_ai(&model, SAMPLE_CV, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::AiProcessingFailed(_)));
        assert_eq!(sink.percentages().last(), Some(&85));
    }

    #[tokio::test]
    async fn test_model_error_is_masked() {
        let model =
            MockChatModel::with_responses([MockResponse::api_error(401, "Incorrect API key sk-123")]);
        let err = process_cv_with_ai(&model, SAMPLE_CV, &NoopSink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), AI_PROCESSING_FAILED);
        assert!(!err.to_string().contains("sk-123"));
    }

    #[tokio::test]
    async fn test_fabricated_employer_fails_run() {
        let mut invented = extraction();
        invented["experience"][0]["company"] = json!("Acme Global Energy");
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("high", &[])),
            MockResponse::json(invented),
        ]);

        let err = process_cv_with_ai(&model, SAMPLE_CV, &NoopSink)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AiProcessingFailed(StageError::Fabricated {
                field: "company",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_education_is_allowed() {
        let model = MockChatModel::with_responses([
            MockResponse::json(strategy("high", &[])),
            MockResponse::json(json!({
                "firstName": "Unknown",
                "objective": "Looking for a position",
                "skills": {"General Skills": "Did something"},
                "experience": [{
                    "company": "Company A",
                    "position": "Position A",
                    "period": "2020-2021",
                    "responsibilities": ["Did something"]
                }],
                "formattingNotes": [],
                "piiRemoved": []
            })),
        ]);
        let incomplete = "CAREER OBJECTIVE\nLooking for a position.\n\nWORK HISTORY\n\
            Company A | Position A | 2020-2021\n• Did something";

        let cv = process_cv_with_ai(&model, incomplete, &NoopSink)
            .await
            .unwrap();
        assert_eq!(cv.experience.len(), 1);
        assert!(cv.education.is_empty());
    }
}
