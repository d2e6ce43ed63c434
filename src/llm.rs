//! Chat-completion client
//!
//! One stateless request per call: the full turn list goes out, the first
//! choice's text comes back.

mod error;
mod groq;

#[cfg(test)]
pub mod testing;

pub use error::{LlmError, LlmErrorKind};
pub use groq::{GroqService, DEFAULT_BASE_URL};

use crate::conversation::Turn;
use crate::credentials::Credential;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion backends
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the ordered turns and return the reply text
    async fn complete(&self, turns: &[Turn]) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, turns: &[Turn]) -> Result<String, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(turns).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = turns.len(),
                    reply_chars = reply.chars().count(),
                    "Completion request finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Completion request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Builds a client for each render cycle from the resolved credential
pub trait ClientFactory: Send + Sync {
    fn make_client(&self, credential: &Credential) -> Result<Arc<dyn CompletionService>, LlmError>;
}

/// Production factory: Groq clients sharing one HTTP connection pool
pub struct GroqClientFactory {
    http: reqwest::Client,
    base_url: String,
}

impl GroqClientFactory {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl ClientFactory for GroqClientFactory {
    fn make_client(&self, credential: &Credential) -> Result<Arc<dyn CompletionService>, LlmError> {
        let service = GroqService::new(self.http.clone(), credential, &self.base_url)?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}
