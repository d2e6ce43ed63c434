//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{ChatRequest, ConversationView, ErrorResponse, SuccessResponse};
use super::AppState;
use crate::chat::{self, ClientStatus};
use crate::session::Session;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::{headers::Cookie, TypedHeader};

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "groq_chat_session";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the page
        .route("/", get(serve_spa))
        // Static assets
        .route("/assets/*path", get(serve_static))
        // Session view
        .route("/api/conversation", get(get_conversation))
        .route("/api/conversation/reset", post(reset_conversation))
        // User actions
        .route("/api/chat", post(send_chat))
        // Lifecycle
        .route("/api/session", delete(end_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Session View
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, AppError> {
    let session = open_session(&state, cookies.as_ref()).await;
    let status = ClientStatus::prepare(&state.credentials, state.clients.as_ref());

    let view = ConversationView::new(&*session.conversation.lock().await, &status);
    respond(&session, view)
}

async fn reset_conversation(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, AppError> {
    let session = open_session(&state, cookies.as_ref()).await;
    let status = ClientStatus::prepare(&state.credentials, state.clients.as_ref());

    let mut conversation = session.conversation.lock().await;
    let discarded = conversation.len();
    conversation.reset();
    tracing::info!(session = %session.id, discarded, "Conversation cleared");

    let view = ConversationView::new(&conversation, &status);
    drop(conversation);
    respond(&session, view)
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let session = open_session(&state, cookies.as_ref()).await;
    let status = ClientStatus::prepare(&state.credentials, state.clients.as_ref());

    // Held across the completion call: one submission per session at a time
    let mut conversation = session.conversation.lock().await;
    let submitted = chat::submit(&mut conversation, &req.text, status.client()).await;
    if submitted {
        tracing::info!(
            session = %session.id,
            turns = conversation.len(),
            client_ready = status.client().is_some(),
            "Chat submission handled"
        );
    }

    let view = ConversationView::new(&conversation, &status);
    drop(conversation);
    respond(&session, view)
}

// ============================================================
// Lifecycle
// ============================================================

async fn end_session(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, AppError> {
    let success = match session_id(cookies.as_ref()) {
        Some(id) => state.sessions.end(id).await,
        None => false,
    };

    let expired = HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
    ))
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [(header::SET_COOKIE, expired)],
        Json(SuccessResponse { success }),
    )
        .into_response())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("groq-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Session Cookie
// ============================================================

fn session_id(cookies: Option<&TypedHeader<Cookie>>) -> Option<&str> {
    cookies.and_then(|TypedHeader(cookie)| cookie.get(SESSION_COOKIE))
}

async fn open_session(state: &AppState, cookies: Option<&TypedHeader<Cookie>>) -> Session {
    state.sessions.initialize(session_id(cookies)).await
}

/// JSON view, setting the session cookie when this request started the session
fn respond(session: &Session, view: ConversationView) -> Result<Response, AppError> {
    let mut response = Json(view).into_response();
    if session.created {
        let cookie = HeaderValue::from_str(&format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            SESSION_COOKIE, session.id
        ))
        .map_err(|e| AppError::Internal(e.to_string()))?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
