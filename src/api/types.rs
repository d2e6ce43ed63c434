//! API request and response types

use crate::chat::ClientStatus;
use crate::conversation::{Conversation, Turn};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Everything the page needs to render one session
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationView {
    pub conversation: Vec<Turn>,
    pub api_key_configured: bool,
    pub client_error: Option<String>,
    pub notice: Option<String>,
}

impl ConversationView {
    pub fn new(conversation: &Conversation, status: &ClientStatus) -> Self {
        Self {
            conversation: conversation.turns().to_vec(),
            api_key_configured: status.api_key_configured(),
            client_error: status.client_error().map(str::to_string),
            notice: status.notice().map(str::to_string),
        }
    }
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
