use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::core::{ChatRequest, LowLevelClient};
use crate::error::AIError;

/// A scripted reply for [`MockClient`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text as the model output.
    Text(String),
    /// Fail the call with `AIError::Mock`.
    Failure(String),
    /// Sleep before returning the text; used to exercise timeouts.
    Delayed(Duration, String),
}

impl MockResponse {
    pub fn json(value: serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// Shared control surface of a mock: queue replies, inspect what was asked.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    missing_credential: Mutex<bool>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHandle {
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(MockResponse::Text(text.into()));
    }

    /// Number of `ask_raw` calls received so far.
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Make `ensure_credentials` fail as if no API key were configured.
    pub fn set_missing_credential(&self, missing: bool) {
        *lock(&self.missing_credential) = missing;
    }
}

/// Mock client for testing that replays scripted responses in order
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.push(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        lock(&self.handle.requests).push(request);
        let next = lock(&self.handle.responses).pop_front();
        match next {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Failure(message)) => Err(AIError::Mock(message)),
            Some(MockResponse::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => Err(AIError::Mock("no scripted response left".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn ensure_credentials(&self) -> Result<(), AIError> {
        if *lock(&self.handle.missing_credential) {
            return Err(AIError::OpenAI(crate::error::OpenAIError::MissingCredential("MOCK_API_KEY")));
        }
        Ok(())
    }
}
