// Mock interview engine.
// Phase selection lives in orchestrator.rs; each phase builds its own prompt and
// reaches the model only through llm_client::CompletionOracle.

pub mod evaluation;
pub mod feedback;
pub mod greeting;
pub mod handlers;
pub mod history;
pub mod orchestrator;
pub mod prompts;
pub mod questioning;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::llm_client::LlmError;
use crate::models::{Message, Reply};
use history::HistoryWindow;

/// One request-handling behavior of the interview (greet, question, evaluate, summarize).
///
/// Implementations are handed to `Orchestrator` at construction, so tests and
/// alternative backends can replace any phase without touching the selector.
#[async_trait]
pub trait PhaseHandler: Send + Sync {
    async fn handle(&self, query: &str, history: &[Message]) -> Result<Reply, LlmError>;
}

/// Knobs shared by every phase handler.
#[derive(Debug, Clone)]
pub struct InterviewSettings {
    pub topic: String,
    pub model: String,
    pub question_limit: usize,
    pub history_window: HistoryWindow,
}

impl InterviewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topic: config.interview_topic.clone(),
            model: config.llm_model.clone(),
            question_limit: config.question_limit,
            history_window: HistoryWindow::new(config.history_window),
        }
    }
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            topic: "Excel".to_string(),
            model: "gpt-4o".to_string(),
            question_limit: 5,
            history_window: HistoryWindow::new(40),
        }
    }
}

/// Returned in place of a structured result when the oracle output does not
/// match the requested schema. Carries the raw text for the caller to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub raw_output: String,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw_output: raw_output.into(),
        }
    }
}

/// Fills `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are copied through verbatim and never rescanned, so a
/// candidate answer containing `{query}` stays literal. Braces that do not name
/// one of `vars` (the JSON examples in the prompts) are left untouched.
pub(crate) fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
