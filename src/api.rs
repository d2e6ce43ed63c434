//! HTTP API and page for the chat UI

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::credentials::CredentialResolver;
use crate::llm::ClientFactory;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<CredentialResolver>,
    pub clients: Arc<dyn ClientFactory>,
}

impl AppState {
    pub fn new(
        sessions: SessionStore,
        credentials: CredentialResolver,
        clients: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            credentials: Arc::new(credentials),
            clients,
        }
    }
}
