//! Read-only views over the caller-owned conversation history.

use crate::models::{Message, Phase};

/// Substring that marks an untagged assistant message as an asked question.
pub const QUESTION_MARKER: &str = "Question";

/// Prefix identifying an evaluation folded back into history as plain text.
pub const EVALUATION_TAG: &str = "Evaluation:";

/// Stand-in for the question when no assistant message precedes the answer.
pub const UNKNOWN_QUESTION: &str = "Unknown Question";

/// Whether `message` is an interview question already put to the candidate.
///
/// Tagged messages are judged by their tag alone. Untagged assistant messages
/// fall back to the content marker, so any untagged text containing "Question"
/// is counted.
pub fn is_question(message: &Message) -> bool {
    if !message.is_assistant() {
        return false;
    }
    match message.phase {
        Some(phase) => phase == Phase::Questioning,
        None => message.content.contains(QUESTION_MARKER),
    }
}

pub fn count_questions(history: &[Message]) -> usize {
    history.iter().filter(|m| is_question(m)).count()
}

pub fn has_assistant_turn(history: &[Message]) -> bool {
    history.iter().any(Message::is_assistant)
}

/// Content of the most recent assistant message, taken as the question being answered.
pub fn latest_question(history: &[Message]) -> &str {
    history
        .iter()
        .rev()
        .find(|m| m.is_assistant())
        .map(|m| m.content.as_str())
        .unwrap_or(UNKNOWN_QUESTION)
}

/// Evaluations recorded in history, oldest first, with the text tag stripped.
pub fn evaluations(history: &[Message]) -> Vec<&str> {
    history
        .iter()
        .filter(|m| m.is_assistant())
        .filter_map(|m| {
            let content = m.content.trim_start();
            match (m.phase, content.strip_prefix(EVALUATION_TAG)) {
                (_, Some(rest)) => Some(rest.trim()),
                (Some(Phase::Evaluation), None) => Some(content.trim_end()),
                _ => None,
            }
        })
        .collect()
}

/// Flattens history into `Role: content` lines.
pub fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bounds how much history is replayed into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    max_messages: usize,
}

impl HistoryWindow {
    /// `0` disables the window.
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    /// The most recent `max_messages` entries of `history`.
    pub fn apply<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        if self.max_messages == 0 || history.len() <= self.max_messages {
            history
        } else {
            &history[history.len() - self.max_messages..]
        }
    }
}
