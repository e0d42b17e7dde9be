//! Evaluation phase: scores the candidate's latest answer against a fixed rubric.
//!
//! The model is asked for JSON under a schema. Output that does not parse, or
//! that carries scores outside 1–5, becomes an `ErrorRecord` instead of an error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::interview::history::{latest_question, EVALUATION_TAG};
use crate::interview::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::interview::{fill_template, ErrorRecord, InterviewSettings, PhaseHandler};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{
    parse_json, system_and_user, CompletionOracle, CompletionRequest, LlmError, ResponseSchema,
};
use crate::models::{Message, Phase, Reply};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 700;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Score and one-line justification for a single rubric criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: u8,
    pub justification: String,
}

/// Rubric evaluation of one answer. Serialises to exactly the five criteria
/// keys plus `OverallFeedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationResult {
    pub relevance: CriterionScore,
    pub clarity: CriterionScore,
    pub depth: CriterionScore,
    pub accuracy: CriterionScore,
    pub communication: CriterionScore,
    pub overall_feedback: String,
}

impl EvaluationResult {
    pub fn criteria(&self) -> [(&'static str, &CriterionScore); 5] {
        [
            ("Relevance", &self.relevance),
            ("Clarity", &self.clarity),
            ("Depth", &self.depth),
            ("Accuracy", &self.accuracy),
            ("Communication", &self.communication),
        ]
    }

    /// Names of criteria whose score is outside `MIN_SCORE..=MAX_SCORE`.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        self.criteria()
            .into_iter()
            .filter(|(_, c)| !(MIN_SCORE..=MAX_SCORE).contains(&c.score))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn average_score(&self) -> f32 {
        let total: u32 = self.criteria().iter().map(|(_, c)| c.score as u32).sum();
        total as f32 / 5.0
    }
}

/// Either a parsed evaluation or the raw output that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    Evaluated(EvaluationResult),
    Failed(ErrorRecord),
}

impl EvaluationOutcome {
    /// Interprets raw oracle output.
    pub fn from_raw(raw: &str) -> Self {
        let result = match parse_json::<EvaluationResult>(raw) {
            Ok(result) => result,
            Err(e) => {
                warn!("Evaluation output did not match schema: {e}");
                return Self::Failed(ErrorRecord::new(
                    format!("Failed to parse evaluation JSON: {e}"),
                    raw,
                ));
            }
        };

        let invalid = result.out_of_range();
        if !invalid.is_empty() {
            warn!("Evaluation scores out of range for {invalid:?}");
            return Self::Failed(ErrorRecord::new(
                format!(
                    "Scores must be between {MIN_SCORE} and {MAX_SCORE}: {}",
                    invalid.join(", ")
                ),
                raw,
            ));
        }

        Self::Evaluated(result)
    }
}

fn criterion_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "score": {"type": "integer", "minimum": MIN_SCORE, "maximum": MAX_SCORE},
            "justification": {"type": "string"}
        },
        "required": ["score", "justification"],
        "additionalProperties": false
    })
}

pub fn evaluation_schema() -> ResponseSchema {
    ResponseSchema {
        name: "answer_evaluation",
        schema: json!({
            "type": "object",
            "properties": {
                "Relevance": criterion_schema(),
                "Clarity": criterion_schema(),
                "Depth": criterion_schema(),
                "Accuracy": criterion_schema(),
                "Communication": criterion_schema(),
                "OverallFeedback": {"type": "string"}
            },
            "required": [
                "Relevance", "Clarity", "Depth", "Accuracy", "Communication", "OverallFeedback"
            ],
            "additionalProperties": false
        }),
    }
}

pub struct EvaluationHandler {
    oracle: Arc<dyn CompletionOracle>,
    settings: InterviewSettings,
}

impl EvaluationHandler {
    pub fn new(oracle: Arc<dyn CompletionOracle>, settings: InterviewSettings) -> Self {
        Self { oracle, settings }
    }

    /// Evaluates `answer` against the most recent assistant message in `history`.
    pub async fn evaluate(
        &self,
        answer: &str,
        history: &[Message],
    ) -> Result<EvaluationOutcome, LlmError> {
        let question = latest_question(history);
        let system = fill_template(
            EVALUATION_SYSTEM,
            &[("topic", self.settings.topic.as_str()), ("json_only", JSON_ONLY_INSTRUCTION)],
        );
        let prompt = fill_template(
            EVALUATION_PROMPT_TEMPLATE,
            &[("question", question), ("answer", answer)],
        );

        let raw = self
            .oracle
            .complete(CompletionRequest {
                messages: system_and_user(system, prompt),
                model: self.settings.model.clone(),
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
                response_schema: Some(evaluation_schema()),
            })
            .await?;

        let outcome = EvaluationOutcome::from_raw(&raw);
        if let EvaluationOutcome::Evaluated(result) = &outcome {
            info!("Answer evaluated: average score {:.1}", result.average_score());
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PhaseHandler for EvaluationHandler {
    async fn handle(&self, query: &str, history: &[Message]) -> Result<Reply, LlmError> {
        let outcome = self.evaluate(query, history).await?;
        let body = serde_json::to_string(&outcome)?;
        Ok(Reply::new(format!("{EVALUATION_TAG} {body}"), Phase::Evaluation))
    }
}
