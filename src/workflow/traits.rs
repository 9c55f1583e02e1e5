//! Collaborator contracts
//!
//! Each collaborator reads the full transcript and returns a typed output
//! together with the items it produced. Callers append those items in
//! order; collaborators never mutate the transcript they are given.

use crate::llm::LlmError;
use crate::transcript::{Transcript, TurnItem};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Output of one collaborator invocation
#[derive(Debug, Clone)]
pub struct AgentRun<T> {
    pub output: T,
    /// Items to append to the working transcript, in order
    pub new_items: Vec<TurnItem>,
}

impl<T> AgentRun<T> {
    pub fn new(output: T, new_items: Vec<TurnItem>) -> Self {
        Self { output, new_items }
    }
}

/// Hard failures of a collaborator call
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Malformed agent output: {0}")]
    MalformedOutput(String),
    #[error("Agent requested tools for more than {0} rounds")]
    ToolLoopExhausted(usize),
}

/// Maps a transcript to a single topic token
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Raw token as produced by the model; normalization is the caller's job
    async fn classify(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError>;
}

/// Extracts a place reference from the transcript
#[async_trait]
pub trait LocationExtractor: Send + Sync {
    /// `None` (or blank) means no location was mentioned, which is not an error
    async fn extract(
        &self,
        transcript: &Transcript,
    ) -> Result<AgentRun<Option<String>>, AgentError>;
}

/// Topic-bound answer generator
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Opaque answer prose, passed through unmodified
    async fn answer(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TopicClassifier + ?Sized> TopicClassifier for Arc<T> {
    async fn classify(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        (**self).classify(transcript).await
    }
}

#[async_trait]
impl<T: LocationExtractor + ?Sized> LocationExtractor for Arc<T> {
    async fn extract(
        &self,
        transcript: &Transcript,
    ) -> Result<AgentRun<Option<String>>, AgentError> {
        (**self).extract(transcript).await
    }
}

#[async_trait]
impl<T: Specialist + ?Sized> Specialist for Arc<T> {
    async fn answer(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        (**self).answer(transcript).await
    }
}
