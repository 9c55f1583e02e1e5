//! Per-turn routing workflow
//!
//! A turn seeds a working transcript from the caller's prior transcript,
//! decides the topic (confirmation reuse or classification), always
//! extracts a location, and routes to one of four specialists. The
//! workflow never touches session state; the caller persists the
//! returned transcript and topic.

pub mod location;
mod orchestrator;
pub mod router;
pub mod stage;
pub mod topic;
pub mod traits;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use orchestrator::TurnOrchestrator;
pub use router::SpecialistRouter;
pub use topic::Topic;
pub use traits::*;

use crate::transcript::Transcript;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Sole input contract of the workflow
#[derive(Debug, Clone, Default)]
pub struct WorkflowInput {
    /// Submitted user text; must not be blank
    pub text: String,
    /// Transcript accumulated by earlier turns of the session
    pub transcript: Option<Transcript>,
    /// Topic resolved by the previous turn of the session
    pub previous_topic: Option<String>,
}

impl WorkflowInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn with_previous_topic(mut self, topic: Option<String>) -> Self {
        self.previous_topic = topic;
        self
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.text.trim().is_empty() {
            return Err(WorkflowError::EmptyInput);
        }
        Ok(())
    }
}

/// Result of one turn
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub answer_text: String,
    /// Resolved topic label, including unrecognized classifier output.
    /// Absent only when the classifier produced an empty token.
    pub topic: Option<String>,
    pub location: String,
    pub transcript: Transcript,
}

impl ResponseEnvelope {
    /// True when the topic matched none of the known specialists
    pub fn is_unroutable(&self) -> bool {
        self.topic.as_deref().and_then(Topic::parse).is_none()
    }
}

/// Which collaborator a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Classifier,
    Location,
    Specialist(Topic),
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Classifier => write!(f, "topic classifier"),
            Collaborator::Location => write!(f, "location extractor"),
            Collaborator::Specialist(topic) => write!(f, "{topic} specialist"),
        }
    }
}

/// Turn-level failures
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No message provided")]
    EmptyInput,
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        collaborator: Collaborator,
        #[source]
        source: AgentError,
    },
}

impl WorkflowError {
    pub fn collaborator(collaborator: Collaborator) -> impl FnOnce(AgentError) -> Self {
        move |source| WorkflowError::Collaborator {
            collaborator,
            source,
        }
    }
}
