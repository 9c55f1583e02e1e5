//! HTTP API for the chat service

mod handlers;
mod types;

pub use handlers::create_router;

use crate::chat::ChatService;
use crate::llm::ModelRegistry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(chat: ChatService, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            chat: Arc::new(chat),
            llm_registry,
        }
    }
}
