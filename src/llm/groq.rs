//! Groq chat-completion client (`OpenAI`-compatible wire format)

use super::{CompletionService, LlmError, LlmErrorKind};
use crate::conversation::Turn;
use crate::credentials::Credential;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Model every request is sent to
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq's `OpenAI`-compatible API root
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq service implementation
#[derive(Debug)]
pub struct GroqService {
    client: Client,
    authorization: HeaderValue,
    url: String,
    model: String,
}

impl GroqService {
    /// Bind a shared HTTP client to a credential.
    ///
    /// Fails when the key can't be carried in an `Authorization` header.
    pub fn new(client: Client, credential: &Credential, base_url: &str) -> Result<Self, LlmError> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", credential.expose())).map_err(|_| {
                LlmError::auth("API key contains characters that are not valid in an HTTP header")
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            authorization,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    fn translate_request(&self, turns: &[Turn]) -> GroqRequest {
        GroqRequest {
            model: self.model.clone(),
            messages: turns
                .iter()
                .map(|turn| GroqMessage {
                    role: turn.role.as_str().to_string(),
                    content: Some(turn.content.clone()),
                })
                .collect(),
            stream: false,
        }
    }

    fn normalize_response(resp: GroqResponse) -> Result<String, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        if let Some(usage) = resp.usage {
            tracing::debug!(
                input_tokens = usage.prompt_tokens,
                output_tokens = usage.completion_tokens,
                finish_reason = ?choice.finish_reason,
                "Groq usage"
            );
        }

        choice
            .message
            .content
            .ok_or_else(|| LlmError::unknown("No message content in response"))
    }

    fn error_from_status(status: reqwest::StatusCode, body: &str) -> LlmError {
        let kind = LlmErrorKind::from_status(status.as_u16());
        if let Ok(error_resp) = serde_json::from_str::<GroqErrorResponse>(body) {
            let message = error_resp.error.message;
            let message = match kind {
                LlmErrorKind::Auth => format!("Authentication failed: {message}"),
                LlmErrorKind::RateLimit => format!("Rate limit exceeded: {message}"),
                LlmErrorKind::InvalidRequest => format!("Invalid request: {message}"),
                LlmErrorKind::ServerError => format!("Server error: {message}"),
                LlmErrorKind::Network | LlmErrorKind::Unknown => {
                    format!("HTTP {status}: {message}")
                }
            };
            return LlmError::new(kind, message);
        }
        LlmError::new(kind, format!("HTTP {status} error: {body}"))
    }
}

#[async_trait]
impl CompletionService for GroqService {
    async fn complete(&self, turns: &[Turn]) -> Result<String, LlmError> {
        let request = self.translate_request(turns);

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, self.authorization.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::error_from_status(status, &body));
        }

        let groq_response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(groq_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Groq API types

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqError,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
    }

    #[derive(Clone)]
    struct Stub {
        status: StatusCode,
        reply: Value,
        recorded: Recorded,
    }

    async fn stub_completion(
        State(stub): State<Stub>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        stub.recorded.bodies.lock().unwrap().push(body);
        if let Some(auth) = headers.get("authorization") {
            let auth = auth.to_str().unwrap().to_string();
            stub.recorded.auth.lock().unwrap().push(auth);
        }
        (stub.status, Json(stub.reply))
    }

    /// Serve a canned reply on a loopback port and return its base URL
    async fn stub_server(status: StatusCode, reply: Value) -> (String, Recorded) {
        let recorded = Recorded::default();
        let stub = Stub {
            status,
            reply,
            recorded: recorded.clone(),
        };

        let app = Router::new()
            .route("/openai/v1/chat/completions", post(stub_completion))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/openai/v1"), recorded)
    }

    fn service(base_url: &str) -> GroqService {
        let credential = Credential::new("gsk_test").unwrap();
        GroqService::new(Client::new(), &credential, base_url).unwrap()
    }

    fn hello_conversation() -> Conversation {
        let mut conv = Conversation::new();
        conv.append(Turn::user("Hello"));
        conv
    }

    #[test]
    fn test_translate_request_keeps_order_and_model() {
        let svc = service(DEFAULT_BASE_URL);
        let mut conv = hello_conversation();
        conv.append(Turn::assistant("Hi"));
        conv.append(Turn::user("How are you?"));

        let json = serde_json::to_value(svc.translate_request(conv.turns())).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi" },
                    { "role": "user", "content": "How are you?" }
                ],
                "stream": false
            })
        );
        assert_eq!(svc.url, "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let svc = service("http://localhost:9999/v1/");
        assert_eq!(svc.url, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_invalid_header_credential_fails_construction() {
        let credential = Credential::new("bad\nkey").unwrap();
        let err = GroqService::new(Client::new(), &credential, DEFAULT_BASE_URL).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
    }

    #[test]
    fn test_normalize_takes_first_choice() {
        let resp: GroqResponse = serde_json::from_value(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "first" }, "finish_reason": "stop" },
                { "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
        }))
        .unwrap();
        assert_eq!(GroqService::normalize_response(resp).unwrap(), "first");
    }

    #[test]
    fn test_normalize_rejects_empty_choices() {
        let resp: GroqResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = GroqService::normalize_response(resp).unwrap_err();
        assert_eq!(err.message, "No choices in response");
    }

    #[test]
    fn test_error_from_status_parses_api_error() {
        let body = json!({
            "error": {
                "message": "Invalid API Key",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })
        .to_string();
        let err = GroqService::error_from_status(reqwest::StatusCode::UNAUTHORIZED, &body);
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert_eq!(err.message, "Authentication failed: Invalid API Key");

        let err = GroqService::error_from_status(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert!(err.message.starts_with("HTTP 502 Bad Gateway error"));
    }

    #[tokio::test]
    async fn test_complete_against_stub_server() {
        let (base_url, recorded) = stub_server(
            StatusCode::OK,
            json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "Hi there!" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8 }
            }),
        )
        .await;

        let svc = service(&base_url);
        let reply = svc.complete(hello_conversation().turns()).await.unwrap();
        assert_eq!(reply, "Hi there!");

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["model"], "llama-3.3-70b-versatile");
        assert_eq!(bodies[0]["messages"].as_array().unwrap().len(), 2);
        assert_eq!(bodies[0]["messages"][1]["content"], "Hello");
        assert_eq!(recorded.auth.lock().unwrap()[0], "Bearer gsk_test");
    }

    #[tokio::test]
    async fn test_complete_maps_api_error() {
        let (base_url, _recorded) = stub_server(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "slow down", "type": "tokens" } }),
        )
        .await;

        let err = service(&base_url)
            .complete(hello_conversation().turns())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert_eq!(err.message, "Rate limit exceeded: slow down");
    }

    #[tokio::test]
    async fn test_complete_rejects_malformed_body() {
        let (base_url, _recorded) =
            stub_server(StatusCode::OK, json!({ "unexpected": true })).await;

        let err = service(&base_url)
            .complete(hello_conversation().turns())
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Failed to parse response"));
    }

    #[tokio::test]
    async fn test_complete_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = service(&format!("http://{addr}/v1"))
            .complete(hello_conversation().turns())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
    }
}
