use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalised label used when history is flattened into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// The interview phase that produced an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Greeting,
    Questioning,
    Evaluation,
    Feedback,
}

/// A single conversation turn.
///
/// `phase` is optional so clients that only send `{role, content}` keep working;
/// those messages fall back to content-marker detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            phase: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            phase: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            phase: None,
        }
    }

    pub fn tagged(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// What a phase produced for one turn. Callers append `text` to their history
/// as an assistant message carrying `phase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// `None` when the turn did not advance the interview (e.g. a recoverable failure).
    pub phase: Option<Phase>,
}

impl Reply {
    pub fn new(text: impl Into<String>, phase: Phase) -> Self {
        Self {
            text: text.into(),
            phase: Some(phase),
        }
    }

    pub fn untagged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phase: None,
        }
    }

    pub fn into_message(self) -> Message {
        match self.phase {
            Some(phase) => Message::assistant(self.text).tagged(phase),
            None => Message::assistant(self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_wire_message_deserializes() {
        let json = r#"{"role": "assistant", "content": "Question 1: What is VLOOKUP?"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert!(message.phase.is_none());
    }

    #[test]
    fn test_tagged_message_round_trips_phase() {
        let message = Message::assistant("Welcome!").tagged(Phase::Greeting);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["phase"], "greeting");
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn test_untagged_message_omits_phase_field() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(value.get("phase").is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"role": "tool", "content": "x"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_reply_into_message_keeps_tag() {
        let message = Reply::new("Question 2: ...", Phase::Questioning).into_message();
        assert!(message.is_assistant());
        assert_eq!(message.phase, Some(Phase::Questioning));
    }
}
