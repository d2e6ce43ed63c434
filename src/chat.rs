//! One chat submission: append the user turn, then exactly one assistant turn
//!
//! Every failure ends up as displayable text inside the conversation.

use crate::conversation::{Conversation, Turn};
use crate::credentials::CredentialResolver;
use crate::llm::{ClientFactory, CompletionService, LlmError};
use std::sync::Arc;

/// Assistant reply used when no client is available
pub const NOT_CONFIGURED_REPLY: &str = "(Groq API key not configured.)";

/// Info shown when no key could be resolved
pub const NO_KEY_NOTICE: &str = "No Groq API key found. Add `Groq_api_key` in the secrets file \
     (recommended) or set `GROQ_API_KEY` env var for local testing.";

/// Prefix of assistant turns produced by a failed completion
pub const API_ERROR_PREFIX: &str = "Error calling Groq API: ";

/// Fail-soft rendering of a completion error
pub fn api_error_reply(error: &LlmError) -> String {
    format!("{API_ERROR_PREFIX}{error}")
}

/// Whether a completion client is usable for this render cycle
pub enum ClientStatus {
    Ready(Arc<dyn CompletionService>),
    /// No credential was found
    NotConfigured,
    /// A credential was found but the client could not be built
    Failed(String),
}

impl ClientStatus {
    /// Resolve the credential and build a client, once per request
    pub fn prepare(resolver: &CredentialResolver, factory: &dyn ClientFactory) -> Self {
        let Some(credential) = resolver.resolve() else {
            return ClientStatus::NotConfigured;
        };

        match factory.make_client(&credential) {
            Ok(client) => ClientStatus::Ready(client),
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind.as_str(), "Client construction failed");
                ClientStatus::Failed(format!("Failed to initialize Groq client: {e}"))
            }
        }
    }

    pub fn client(&self) -> Option<&dyn CompletionService> {
        match self {
            ClientStatus::Ready(client) => Some(client.as_ref()),
            ClientStatus::NotConfigured | ClientStatus::Failed(_) => None,
        }
    }

    pub fn api_key_configured(&self) -> bool {
        !matches!(self, ClientStatus::NotConfigured)
    }

    pub fn client_error(&self) -> Option<&str> {
        match self {
            ClientStatus::Failed(message) => Some(message),
            ClientStatus::Ready(_) | ClientStatus::NotConfigured => None,
        }
    }

    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ClientStatus::NotConfigured => Some(NO_KEY_NOTICE),
            ClientStatus::Ready(_) | ClientStatus::Failed(_) => None,
        }
    }
}

/// Run one submission against `conversation`.
///
/// Blank input is ignored and returns false. Otherwise the user turn and
/// one assistant turn are appended: the model's reply, the error text, or
/// the not-configured placeholder when `client` is None.
pub async fn submit(
    conversation: &mut Conversation,
    text: &str,
    client: Option<&dyn CompletionService>,
) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    conversation.append(Turn::user(text));

    let reply = match client {
        None => NOT_CONFIGURED_REPLY.to_string(),
        Some(client) => match client.complete(conversation.turns()).await {
            Ok(reply) => reply,
            Err(e) => api_error_reply(&e),
        },
    };

    conversation.append(Turn::assistant(reply));
    true
}
