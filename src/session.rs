//! Per-session conversational memory
//!
//! A session holds the transcript returned by its last committed turn and
//! the last resolved topic. Writes are compare-and-swap against the
//! version read at the start of the turn.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::transcript::Transcript;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_SESSION_ID: &str = "default";

/// What a session remembers between turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub transcript: Transcript,
    pub last_topic: Option<String>,
}

/// A record together with the version it was read at.
/// Version 0 means the session has never been committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    #[serde(flatten)]
    pub record: SessionRecord,
    pub version: u64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} was modified by a concurrent turn")]
    Conflict(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored record, or `None` if the session was never committed
    async fn get(&self, session_id: &str) -> Result<Option<VersionedRecord>, SessionError>;

    /// Replace the record if its version still equals `expected_version`.
    /// Returns the new version.
    async fn compare_and_swap(
        &self,
        session_id: &str,
        record: SessionRecord,
        expected_version: u64,
    ) -> Result<u64, SessionError>;

    /// Stored record, or an empty one at version 0
    async fn load(&self, session_id: &str) -> Result<VersionedRecord, SessionError> {
        Ok(self.get(session_id).await?.unwrap_or_default())
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, session_id: &str) -> Result<Option<VersionedRecord>, SessionError> {
        (**self).get(session_id).await
    }

    async fn compare_and_swap(
        &self,
        session_id: &str,
        record: SessionRecord,
        expected_version: u64,
    ) -> Result<u64, SessionError> {
        (**self)
            .compare_and_swap(session_id, record, expected_version)
            .await
    }

    async fn load(&self, session_id: &str) -> Result<VersionedRecord, SessionError> {
        (**self).load(session_id).await
    }
}
