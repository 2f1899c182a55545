use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatModel, ChatRequest, LlmError};

/// Scripted stand-in for the LLM. Replies are consumed in order; every request is recorded.
pub struct MockChatModel {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

#[derive(Debug)]
pub enum MockResponse {
    Text(String),
    Error(LlmError),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Text(value.to_string())
    }

    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        MockResponse::Error(LlmError::Api {
            status,
            message: message.into(),
        })
    }
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let mock = Self::new();
        mock.responses.lock().unwrap().extend(responses);
        mock
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Text(content)) => Ok(content),
            Some(MockResponse::Error(e)) => Err(e),
            None => Err(LlmError::EmptyContent),
        }
    }
}
