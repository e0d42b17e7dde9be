//! Scripted `CompletionOracle` for tests.
//!
//! Responses are consumed in order; every request is recorded so tests can
//! inspect the prompt a handler built.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CompletionOracle, CompletionRequest, LlmError};

#[derive(Debug)]
enum Scripted {
    Text(String),
    Fail { status: u16, message: String },
}

#[derive(Clone, Default)]
pub struct ScriptedOracle {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Text(text.into()));
        self
    }

    pub fn with_failure(self, status: u16, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Scripted::Fail {
            status,
            message: message.into(),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> CompletionRequest {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("oracle was never called")
    }
}

#[async_trait]
impl CompletionOracle for ScriptedOracle {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Fail { status, message }) => Err(LlmError::Api { status, message }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
