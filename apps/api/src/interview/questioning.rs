//! Questioning phase: asks the next topic question.
//!
//! Avoiding repeats and escalating difficulty are left to the model; this
//! handler only forwards the conversation so far.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::interview::history::format_history;
use crate::interview::prompts::{QUESTIONING_SYSTEM, QUESTIONING_USER_TEMPLATE};
use crate::interview::{fill_template, InterviewSettings, PhaseHandler};
use crate::llm_client::{system_and_user, CompletionOracle, CompletionRequest, LlmError};
use crate::models::{Message, Phase, Reply};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 256;

/// Returned instead of an error when the oracle call fails.
pub const QUESTION_APOLOGY: &str =
    "It seems there was an error in generating the question. Let's try again.";

/// Phrase the model is told to use once the question limit is reached.
pub const COMPLETION_PHRASE: &str = "Thank you. The interview is complete.";

pub struct QuestioningHandler {
    oracle: Arc<dyn CompletionOracle>,
    settings: InterviewSettings,
}

impl QuestioningHandler {
    pub fn new(oracle: Arc<dyn CompletionOracle>, settings: InterviewSettings) -> Self {
        Self { oracle, settings }
    }

    fn build_messages(&self, query: &str, history: &[Message]) -> Vec<Message> {
        let limit = self.settings.question_limit.to_string();
        let system = fill_template(
            QUESTIONING_SYSTEM,
            &[
                ("topic", self.settings.topic.as_str()),
                ("limit", limit.as_str()),
                ("completion_phrase", COMPLETION_PHRASE),
            ],
        );
        let formatted = format_history(self.settings.history_window.apply(history));
        let user = fill_template(
            QUESTIONING_USER_TEMPLATE,
            &[("history", formatted.as_str()), ("query", query)],
        );
        system_and_user(system, user)
    }
}

#[async_trait]
impl PhaseHandler for QuestioningHandler {
    async fn handle(&self, query: &str, history: &[Message]) -> Result<Reply, LlmError> {
        let request = CompletionRequest {
            messages: self.build_messages(query, history),
            model: self.settings.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_schema: None,
        };

        match self.oracle.complete(request).await {
            Ok(question) => {
                info!("Generated question: {question}");
                Ok(Reply::new(question, Phase::Questioning))
            }
            Err(e) => {
                error!("Error generating question: {e}");
                Ok(Reply::untagged(QUESTION_APOLOGY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::history::{count_questions, HistoryWindow};
    use crate::llm_client::mock::ScriptedOracle;

    fn handler(oracle: &ScriptedOracle, settings: InterviewSettings) -> QuestioningHandler {
        QuestioningHandler::new(Arc::new(oracle.clone()), settings)
    }

    fn two_question_history() -> Vec<Message> {
        vec![
            Message::user("Hi"),
            Message::assistant("Welcome! Ready?"),
            Message::user("Yes"),
            Message::assistant("Question 1: What does SUM do?"),
            Message::user("Adds numbers"),
            Message::assistant("Question 2: What does VLOOKUP do?"),
        ]
    }

    #[tokio::test]
    async fn test_full_history_is_forwarded() {
        let oracle = ScriptedOracle::new().with_response("Question 3: Explain XLOOKUP.");
        let history = two_question_history();

        let reply = handler(&oracle, InterviewSettings::default())
            .handle("My answer", &history)
            .await
            .unwrap();

        assert_eq!(reply.text, "Question 3: Explain XLOOKUP.");
        assert_eq!(reply.phase, Some(Phase::Questioning));

        let call = oracle.last_call();
        assert_eq!(call.messages.len(), 2);
        let user = &call.messages[1].content;
        assert!(user.contains("User: Hi"));
        assert!(user.contains("Assistant: Question 2: What does VLOOKUP do?"));
        assert!(user.ends_with("Candidate's latest input: My answer"));
    }

    #[tokio::test]
    async fn test_system_prompt_carries_limit_and_completion_phrase() {
        let oracle = ScriptedOracle::new().with_response("Question 2: ...");
        let settings = InterviewSettings {
            question_limit: 7,
            ..InterviewSettings::default()
        };

        handler(&oracle, settings).handle("ok", &[]).await.unwrap();

        let system = &oracle.last_call().messages[0].content;
        assert!(system.contains("reached 7 questions"));
        assert!(system.contains(COMPLETION_PHRASE));
        assert!(!system.contains("{limit}"));
        assert!(!system.contains("{topic}"));
    }

    #[tokio::test]
    async fn test_oracle_failure_becomes_apology() {
        let oracle = ScriptedOracle::new().with_failure(503, "overloaded");

        let reply = handler(&oracle, InterviewSettings::default())
            .handle("My answer", &two_question_history())
            .await
            .unwrap();

        assert_eq!(reply.text, QUESTION_APOLOGY);
        assert!(reply.phase.is_none());
        // Folding the apology back into history must not advance the count.
        let mut history = two_question_history();
        history.push(reply.into_message());
        assert_eq!(count_questions(&history), 2);
    }

    #[tokio::test]
    async fn test_history_window_limits_replayed_turns() {
        let oracle = ScriptedOracle::new().with_response("Question 3: ...");
        let settings = InterviewSettings {
            history_window: HistoryWindow::new(2),
            ..InterviewSettings::default()
        };

        handler(&oracle, settings)
            .handle("My answer", &two_question_history())
            .await
            .unwrap();

        let user = &oracle.last_call().messages[1].content;
        assert!(!user.contains("User: Hi"));
        assert!(user.contains("User: Adds numbers"));
        assert!(user.contains("Assistant: Question 2"));
    }

    #[tokio::test]
    async fn test_placeholder_text_in_history_is_forwarded_verbatim() {
        let oracle = ScriptedOracle::new().with_response("Question 2: ...");
        let history = vec![
            Message::assistant("Question 1: How do you reference a cell?"),
            Message::user("I typed {query} literally"),
        ];

        handler(&oracle, InterviewSettings::default())
            .handle("LATEST", &history)
            .await
            .unwrap();

        let user = &oracle.last_call().messages[1].content;
        assert!(user.contains("User: I typed {query} literally"));
        assert!(user.ends_with("Candidate's latest input: LATEST"));
    }
}
