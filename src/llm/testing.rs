//! Mock implementations for testing
//!
//! These mocks exercise the chat flow and HTTP handlers without network I/O.

use super::{ClientFactory, CompletionService, LlmError};
use crate::conversation::Turn;
use crate::credentials::Credential;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock completion client that returns queued replies
pub struct MockCompletionService {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    model_id: String,
    /// Turns sent on each call
    pub requests: Mutex<Vec<Vec<Turn>>>,
}

impl MockCompletionService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue an error
    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, turns: &[Turn]) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Factory handing out one shared mock, or failing construction
pub enum MockClientFactory {
    Ready(Arc<MockCompletionService>),
    Broken(String),
}

impl ClientFactory for MockClientFactory {
    fn make_client(
        &self,
        _credential: &Credential,
    ) -> Result<Arc<dyn CompletionService>, LlmError> {
        match self {
            MockClientFactory::Ready(mock) => Ok(mock.clone()),
            MockClientFactory::Broken(message) => Err(LlmError::auth(message.clone())),
        }
    }
}
