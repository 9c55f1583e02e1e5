//! Session store backed by the `SQLite` database

use super::{SessionError, SessionRecord, SessionStore, VersionedRecord};
use crate::db::Database;
use async_trait::async_trait;

/// Adapter to use [`Database`] as a [`SessionStore`]
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<VersionedRecord>, SessionError> {
        let stored = self
            .db
            .get_session(session_id)
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        Ok(stored.map(|s| VersionedRecord {
            record: SessionRecord {
                transcript: s.transcript,
                last_topic: s.last_topic,
            },
            version: s.version,
        }))
    }

    async fn compare_and_swap(
        &self,
        session_id: &str,
        record: SessionRecord,
        expected_version: u64,
    ) -> Result<u64, SessionError> {
        self.db
            .compare_and_swap_session(
                session_id,
                &record.transcript,
                record.last_topic.as_deref(),
                expected_version,
            )
            .map_err(|e| SessionError::Storage(e.to_string()))?
            .ok_or_else(|| SessionError::Conflict(session_id.to_string()))
    }
}
