//! Database module for `EcoBot`
//!
//! Provides persistence for session records and the interaction log.

mod schema;

pub use schema::*;

use crate::evaluation::Evaluation;
use crate::transcript::Transcript;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Interaction not found: {0}")]
    InteractionNotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Get a session by ID, if it has ever been committed
    pub fn get_session(&self, id: &str) -> DbResult<Option<StoredSession>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT transcript, last_topic, version FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((transcript, last_topic, version)) = row else {
            return Ok(None);
        };

        Ok(Some(StoredSession {
            transcript: serde_json::from_str(&transcript)?,
            last_topic,
            version: u64::try_from(version).unwrap_or_default(),
        }))
    }

    /// Write a session only if its stored version still equals
    /// `expected_version` (0 meaning "never written").
    ///
    /// Returns the new version, or `None` when another writer got there first.
    pub fn compare_and_swap_session(
        &self,
        id: &str,
        transcript: &Transcript,
        last_topic: Option<&str>,
        expected_version: u64,
    ) -> DbResult<Option<u64>> {
        let transcript = serde_json::to_string(transcript)?;
        let now = format_datetime(Utc::now());
        let expected = i64::try_from(expected_version).unwrap_or(i64::MAX);
        let conn = self.conn.lock().unwrap();

        let rows = if expected_version == 0 {
            conn.execute(
                "INSERT INTO sessions (id, transcript, last_topic, version, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(id) DO NOTHING",
                params![id, transcript, last_topic, now],
            )?
        } else {
            conn.execute(
                "UPDATE sessions SET transcript = ?2, last_topic = ?3, version = version + 1, updated_at = ?4
                 WHERE id = ?1 AND version = ?5",
                params![id, transcript, last_topic, now, expected],
            )?
        };

        Ok((rows == 1).then_some(expected_version + 1))
    }

    // ==================== Interaction Log ====================

    /// Append an interaction
    pub fn insert_interaction(&self, entry: NewInteraction) -> DbResult<Interaction> {
        let interaction = Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_id: entry.session_id,
            user_message: entry.user_message,
            bot_response: entry.bot_response,
            topic: entry.topic,
            evaluation: entry.evaluation,
        };
        let evaluation = interaction
            .evaluation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO interactions (id, session_id, user_message, bot_response, topic, evaluation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                interaction.id,
                interaction.session_id,
                interaction.user_message,
                interaction.bot_response,
                interaction.topic,
                evaluation,
                format_datetime(interaction.timestamp),
            ],
        )?;

        Ok(interaction)
    }

    /// All interactions, newest first
    pub fn list_interactions(&self) -> DbResult<Vec<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, user_message, bot_response, topic, evaluation, created_at
             FROM interactions
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut interactions = Vec::new();
        for row in rows {
            let (id, session_id, user_message, bot_response, topic, evaluation, created_at) =
                row?;
            interactions.push(Interaction {
                id,
                timestamp: parse_datetime(&created_at),
                session_id,
                user_message,
                bot_response,
                topic,
                evaluation: parse_evaluation(evaluation.as_deref()),
            });
        }
        Ok(interactions)
    }

    /// Fails with [`DbError::InteractionNotFound`] for an unknown id
    pub fn ensure_interaction(&self, id: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let found = conn
            .query_row("SELECT 1 FROM interactions WHERE id = ?1", params![id], |_| {
                Ok(())
            })
            .optional()?;
        found.ok_or_else(|| DbError::InteractionNotFound(id.to_string()))
    }

    /// Replace the evaluation of a logged interaction
    pub fn update_interaction_evaluation(&self, id: &str, evaluation: &Evaluation) -> DbResult<()> {
        let evaluation = serde_json::to_string(evaluation)?;
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE interactions SET evaluation = ?2 WHERE id = ?1",
            params![id, evaluation],
        )?;
        if rows == 0 {
            return Err(DbError::InteractionNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Unreadable evaluations are dropped rather than failing the listing
fn parse_evaluation(raw: Option<&str>) -> Option<Evaluation> {
    raw.and_then(|s| match serde_json::from_str(s) {
        Ok(evaluation) => Some(evaluation),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unreadable stored evaluation");
            None
        }
    })
}

/// Fixed-width timestamps so text ordering matches time ordering
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
