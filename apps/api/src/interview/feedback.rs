//! Feedback phase: turns the evaluations recorded in history into a final report.
//!
//! Only assistant messages tagged as evaluations (or prefixed `Evaluation:`)
//! are used. With none present the oracle is never called.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::interview::evaluation::{MAX_SCORE, MIN_SCORE};
use crate::interview::history::evaluations;
use crate::interview::prompts::{FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_SYSTEM};
use crate::interview::{fill_template, ErrorRecord, InterviewSettings, PhaseHandler};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{
    parse_json, system_and_user, CompletionOracle, CompletionRequest, LlmError, ResponseSchema,
};
use crate::models::{Message, Phase, Reply};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 800;

pub const NO_EVALUATIONS_SENTINEL: &str =
    "No evaluations found in history. Cannot generate feedback.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Advance,
    DoNotAdvance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub overall_score: u8,
    pub recommendation: Recommendation,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Report(FeedbackResult),
    Failed(ErrorRecord),
    NoEvaluations,
}

impl FeedbackOutcome {
    pub fn from_raw(raw: &str) -> Self {
        match parse_json::<FeedbackResult>(raw) {
            Ok(report) if (MIN_SCORE..=MAX_SCORE).contains(&report.overall_score) => {
                Self::Report(report)
            }
            Ok(report) => {
                warn!("Feedback overall_score {} out of range", report.overall_score);
                Self::Failed(ErrorRecord::new(
                    format!(
                        "overall_score must be between {MIN_SCORE} and {MAX_SCORE}, got {}",
                        report.overall_score
                    ),
                    raw,
                ))
            }
            Err(e) => {
                warn!("Feedback output did not match schema: {e}");
                Self::Failed(ErrorRecord::new(
                    format!("Failed to parse feedback JSON: {e}"),
                    raw,
                ))
            }
        }
    }

    /// Text handed back to the caller: the JSON record, or the sentinel.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Report(report) => serde_json::to_string(report),
            Self::Failed(record) => serde_json::to_string(record),
            Self::NoEvaluations => Ok(NO_EVALUATIONS_SENTINEL.to_string()),
        }
    }
}

pub fn feedback_schema() -> ResponseSchema {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    ResponseSchema {
        name: "interview_feedback",
        schema: json!({
            "type": "object",
            "properties": {
                "strengths": string_list,
                "weaknesses": string_list,
                "areas_for_improvement": string_list,
                "overall_score": {"type": "integer", "minimum": MIN_SCORE, "maximum": MAX_SCORE},
                "recommendation": {"type": "string", "enum": ["advance", "do_not_advance"]},
                "summary": {"type": "string"}
            },
            "required": [
                "strengths", "weaknesses", "areas_for_improvement",
                "overall_score", "recommendation", "summary"
            ],
            "additionalProperties": false
        }),
    }
}

pub struct FeedbackHandler {
    oracle: Arc<dyn CompletionOracle>,
    settings: InterviewSettings,
}

impl FeedbackHandler {
    pub fn new(oracle: Arc<dyn CompletionOracle>, settings: InterviewSettings) -> Self {
        Self { oracle, settings }
    }

    /// Builds the final report from the evaluations in `history`.
    /// `request` is passed through as an extra instruction for the report.
    pub async fn generate_feedback(
        &self,
        request: &str,
        history: &[Message],
    ) -> Result<FeedbackOutcome, LlmError> {
        let found = evaluations(history);
        if found.is_empty() {
            info!("No evaluations in history; skipping feedback generation");
            return Ok(FeedbackOutcome::NoEvaluations);
        }
        info!("Generating feedback from {} evaluations", found.len());

        let system = fill_template(
            FEEDBACK_SYSTEM,
            &[("topic", self.settings.topic.as_str()), ("json_only", JSON_ONLY_INSTRUCTION)],
        );
        let numbered = found
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = fill_template(
            FEEDBACK_PROMPT_TEMPLATE,
            &[("evaluations", numbered.as_str()), ("request", request)],
        );

        let raw = self
            .oracle
            .complete(CompletionRequest {
                messages: system_and_user(system, prompt),
                model: self.settings.model.clone(),
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
                response_schema: Some(feedback_schema()),
            })
            .await?;

        Ok(FeedbackOutcome::from_raw(&raw))
    }
}

#[async_trait]
impl PhaseHandler for FeedbackHandler {
    async fn handle(&self, query: &str, history: &[Message]) -> Result<Reply, LlmError> {
        let outcome = self.generate_feedback(query, history).await?;
        Ok(Reply::new(outcome.render()?, Phase::Feedback))
    }
}
