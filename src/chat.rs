//! Chat service
//!
//! Drives one turn on behalf of a client: loads the session, runs the
//! workflow, and commits the new transcript and topic with a single
//! compare-and-swap. A failed turn leaves the session untouched.

use crate::db::{Database, DbError, Interaction, NewInteraction};
use crate::evaluation::{Evaluation, EvaluationError, Evaluator, Grade};
use crate::metrics::TurnMetrics;
use crate::session::{
    SessionError, SessionRecord, SessionStore, VersionedRecord, DEFAULT_SESSION_ID,
};
use crate::transcript::Transcript;
use crate::workflow::{TurnOrchestrator, WorkflowError, WorkflowInput};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No message provided")]
    EmptyMessage,
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Log(#[from] DbError),
    #[error("No evaluator model is configured")]
    EvaluatorUnavailable,
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Client-facing result of a turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub output_text: String,
    pub topic: Option<String>,
    pub location: String,
    pub history: Transcript,
    pub evaluation: Evaluation,
    /// Interaction log entry for this turn, if logging succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
}

#[derive(Clone)]
pub struct ChatService {
    orchestrator: TurnOrchestrator,
    sessions: Arc<dyn SessionStore>,
    log: Database,
    evaluator: Option<Evaluator>,
}

impl ChatService {
    pub fn new(
        orchestrator: TurnOrchestrator,
        sessions: Arc<dyn SessionStore>,
        log: Database,
        evaluator: Option<Evaluator>,
    ) -> Self {
        Self {
            orchestrator,
            sessions,
            log,
            evaluator,
        }
    }

    /// Run one turn for `session_id` (or the default session)
    pub async fn chat(
        &self,
        message: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        let message = match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(ChatError::EmptyMessage),
        };
        let session_id = session_id.unwrap_or(DEFAULT_SESSION_ID);

        let VersionedRecord { record, version } = self.sessions.load(session_id).await?;
        let input = WorkflowInput::new(message)
            .with_transcript(record.transcript)
            .with_previous_topic(record.last_topic.clone());

        let started = Instant::now();
        let envelope = match self.orchestrator.run(input).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(session_id, error = %e, "Turn failed; session left unchanged");
                return Err(e.into());
            }
        };
        let latency = started.elapsed();

        let last_topic = envelope
            .topic
            .clone()
            .filter(|t| !t.is_empty())
            .or(record.last_topic);
        let committed = SessionRecord {
            transcript: envelope.transcript.clone(),
            last_topic: last_topic.clone(),
        };
        let new_version = self
            .sessions
            .compare_and_swap(session_id, committed, version)
            .await
            .inspect_err(|e| tracing::warn!(session_id, error = %e, "Session commit rejected"))?;

        if envelope.is_unroutable() {
            tracing::info!(session_id, topic = ?envelope.topic, "Turn answered without a specialist");
        }
        tracing::info!(
            session_id,
            topic = ?last_topic,
            version = new_version,
            latency_ms = %latency.as_millis(),
            "Turn committed"
        );

        let metrics = TurnMetrics::compute(message, &envelope.answer_text, latency);
        let evaluation = match &self.evaluator {
            Some(evaluator) => {
                evaluator
                    .evaluate_turn(message, &envelope.answer_text, metrics)
                    .await
            }
            None => Evaluation::metrics_only(metrics),
        };

        let logged = self.log.insert_interaction(NewInteraction {
            session_id: session_id.to_string(),
            user_message: message.to_string(),
            bot_response: envelope.answer_text.clone(),
            topic: last_topic,
            evaluation: Some(evaluation.clone()),
        });
        let interaction_id = match logged {
            Ok(interaction) => Some(interaction.id),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to log interaction");
                None
            }
        };

        Ok(ChatReply {
            output_text: envelope.answer_text,
            topic: envelope.topic,
            location: envelope.location,
            history: envelope.transcript,
            evaluation,
            interaction_id,
        })
    }

    /// Stored session, if it was ever committed
    pub async fn session(&self, session_id: &str) -> Result<Option<VersionedRecord>, ChatError> {
        Ok(self.sessions.get(session_id).await?)
    }

    /// Interaction log, newest first
    pub fn interactions(&self) -> Result<Vec<Interaction>, ChatError> {
        Ok(self.log.list_interactions()?)
    }

    /// Grade a logged exchange again on the review rubric and replace its
    /// stored evaluation. The evaluator is only called for a known id.
    pub async fn reevaluate(
        &self,
        interaction_id: &str,
        query: &str,
        response: &str,
    ) -> Result<Grade, ChatError> {
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or(ChatError::EvaluatorUnavailable)?;
        self.log.ensure_interaction(interaction_id)?;
        let grade = evaluator.review(query, response).await?;

        self.log.update_interaction_evaluation(
            interaction_id,
            &Evaluation::graded(grade.clone(), None),
        )?;
        tracing::info!(interaction_id, "Interaction re-evaluated");
        Ok(grade)
    }
}
