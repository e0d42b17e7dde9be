//! Greeting phase: welcomes the candidate, then opens with the first question.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::interview::history::{has_assistant_turn, QUESTION_MARKER};
use crate::interview::prompts::{GREETING_FOLLOW_UP_SYSTEM, GREETING_SYSTEM};
use crate::interview::{fill_template, InterviewSettings, PhaseHandler};
use crate::llm_client::{system_and_user, CompletionOracle, CompletionRequest, LlmError};
use crate::models::{Message, Phase, Reply, Role};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

pub struct GreetingHandler {
    oracle: Arc<dyn CompletionOracle>,
    settings: InterviewSettings,
}

impl GreetingHandler {
    pub fn new(oracle: Arc<dyn CompletionOracle>, settings: InterviewSettings) -> Self {
        Self { oracle, settings }
    }

    fn build_messages(&self, query: &str, history: &[Message]) -> (Vec<Message>, bool) {
        if !has_assistant_turn(history) {
            let system = fill_template(GREETING_SYSTEM, &[("topic", self.settings.topic.as_str())]);
            return (system_and_user(system, query), true);
        }

        let mut messages = vec![Message::system(fill_template(
            GREETING_FOLLOW_UP_SYSTEM,
            &[("topic", self.settings.topic.as_str())],
        ))];
        messages.extend(
            self.settings
                .history_window
                .apply(history)
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        messages.push(Message::user(query));
        (messages, false)
    }
}

#[async_trait]
impl PhaseHandler for GreetingHandler {
    async fn handle(&self, query: &str, history: &[Message]) -> Result<Reply, LlmError> {
        let (messages, first_interaction) = self.build_messages(query, history);
        debug!(
            "Greeting prompt built: first_interaction={first_interaction}, messages={}",
            messages.len()
        );

        let text = self
            .oracle
            .complete(CompletionRequest {
                messages,
                model: self.settings.model.clone(),
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
                response_schema: None,
            })
            .await?;

        // The follow-up turn is expected to open the questioning; only tag it as
        // such once the model actually asked.
        let phase = if !first_interaction && text.contains(QUESTION_MARKER) {
            Phase::Questioning
        } else {
            Phase::Greeting
        };
        Ok(Reply::new(text, phase))
    }
}
