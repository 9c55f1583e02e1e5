//! Turn state and step selection
//!
//! The orchestrator's control flow is a pure function of [`TurnState`]:
//! [`next_step`] names the single collaborator call (or terminal action)
//! that runs next. Each step fills exactly one field, so a turn makes at
//! most three collaborator calls and always terminates.

use super::router::Route;
use super::topic::{self, TopicDecision, DETAILED_ANSWER_HINT};
use super::{ResponseEnvelope, WorkflowInput};
use crate::transcript::{Transcript, TurnItem};

/// Working state of one turn
#[derive(Debug, Clone)]
pub struct TurnState {
    pub transcript: Transcript,
    /// Length of the caller-supplied transcript
    pub prior_len: usize,
    /// Resolved topic label; set by confirmation reuse or classification
    pub topic: Option<String>,
    pub topic_from_confirmation: bool,
    /// Normalized location; `None` until extraction has run
    pub location: Option<String>,
    pub answer: Option<String>,
}

/// The next action of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    ExtractLocation,
    Classify,
    Route(Route),
    Finish,
}

impl TurnState {
    /// Seed the working transcript: prior items, the user item, and the
    /// detailed-answer hint when the previous topic is reused.
    pub fn seed(input: WorkflowInput) -> Self {
        let decision = topic::resolve(input.previous_topic.as_deref(), &input.text);

        let mut transcript = input.transcript.unwrap_or_default();
        let prior_len = transcript.len();
        transcript.push(TurnItem::user(input.text));

        let (topic, topic_from_confirmation) = match decision {
            TopicDecision::Reuse(previous) => {
                transcript.push(TurnItem::system_hint(DETAILED_ANSWER_HINT));
                (Some(previous), true)
            }
            TopicDecision::Classify => (None, false),
        };

        Self {
            transcript,
            prior_len,
            topic,
            topic_from_confirmation,
            location: None,
            answer: None,
        }
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        ResponseEnvelope {
            answer_text: self.answer.unwrap_or_default(),
            topic: self.topic.filter(|t| !t.is_empty()),
            location: self.location.unwrap_or_default(),
            transcript: self.transcript,
        }
    }
}

/// Decide the next action.
///
/// Order: location extraction always runs first, then classification if
/// no topic is fixed yet, then routing, then finish.
pub fn next_step(state: &TurnState) -> Step {
    if state.location.is_none() {
        return Step::ExtractLocation;
    }
    match (&state.topic, &state.answer) {
        (None, _) => Step::Classify,
        (Some(label), None) => Step::Route(Route::for_label(label)),
        (Some(_), Some(_)) => Step::Finish,
    }
}
