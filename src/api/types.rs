//! API request and response types

use crate::db::Interaction;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Request to run one chat turn
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Request to grade a logged interaction again
#[derive(Debug, Deserialize)]
pub struct RunEvalRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Stored session record
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub transcript: Transcript,
    pub last_topic: Option<String>,
    pub version: u64,
}

/// Interaction log, newest first
#[derive(Debug, Serialize)]
pub struct EvaluationsResponse {
    pub interactions: Vec<Interaction>,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default: String,
    pub evaluator: String,
    /// Model behind the `web_search` tool
    pub search: String,
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
