//! Database schema and types

use crate::evaluation::Evaluation;
use crate::transcript::Transcript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    transcript TEXT NOT NULL,
    last_topic TEXT,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interactions (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    user_message TEXT NOT NULL,
    bot_response TEXT NOT NULL,
    topic TEXT,
    evaluation TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interactions_created ON interactions(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_interactions_session ON interactions(session_id);
";

/// Session row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub transcript: Transcript,
    pub last_topic: Option<String>,
    pub version: u64,
}

/// One logged chat exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub topic: Option<String>,
    pub evaluation: Option<Evaluation>,
}

/// Fields supplied when logging an exchange; id and timestamp are assigned
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub topic: Option<String>,
    pub evaluation: Option<Evaluation>,
}
