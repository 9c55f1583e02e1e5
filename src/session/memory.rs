//! In-process session store

use super::{SessionError, SessionRecord, SessionStore, VersionedRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Sessions kept in a map for the lifetime of the process
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, VersionedRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<VersionedRecord>, SessionError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn compare_and_swap(
        &self,
        session_id: &str,
        record: SessionRecord,
        expected_version: u64,
    ) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(session_id).map_or(0, |r| r.version);
        if current != expected_version {
            return Err(SessionError::Conflict(session_id.to_string()));
        }

        let version = expected_version + 1;
        sessions.insert(session_id.to_string(), VersionedRecord { record, version });
        Ok(version)
    }
}
