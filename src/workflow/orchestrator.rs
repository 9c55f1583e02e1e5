//! Turn orchestrator
//!
//! Executes the steps chosen by [`next_step`] one at a time. Every
//! collaborator call is awaited before the next step is chosen.

use super::location::normalize_location;
use super::router::{unroutable_answer, Route, SpecialistRouter};
use super::stage::{next_step, Step, TurnState};
use super::topic::normalize_classification;
use super::traits::{LocationExtractor, TopicClassifier};
use super::{Collaborator, ResponseEnvelope, WorkflowError, WorkflowInput};
use std::sync::Arc;

/// Composes topic resolution, location extraction and routing into one turn
#[derive(Clone)]
pub struct TurnOrchestrator {
    classifier: Arc<dyn TopicClassifier>,
    locator: Arc<dyn LocationExtractor>,
    router: SpecialistRouter,
}

impl TurnOrchestrator {
    pub fn new(
        classifier: Arc<dyn TopicClassifier>,
        locator: Arc<dyn LocationExtractor>,
        router: SpecialistRouter,
    ) -> Self {
        Self {
            classifier,
            locator,
            router,
        }
    }

    /// Run one turn. No external state is mutated; on error nothing of the
    /// working transcript escapes.
    pub async fn run(&self, input: WorkflowInput) -> Result<ResponseEnvelope, WorkflowError> {
        input.validate()?;

        let mut state = TurnState::seed(input);
        if state.topic_from_confirmation {
            tracing::debug!(topic = ?state.topic, "Confirmation reuses previous topic");
        }

        loop {
            match next_step(&state) {
                Step::ExtractLocation => {
                    let run = self
                        .locator
                        .extract(&state.transcript)
                        .await
                        .map_err(WorkflowError::collaborator(Collaborator::Location))?;
                    state.transcript.extend(run.new_items);
                    let location = normalize_location(run.output.as_deref());
                    tracing::debug!(location = %location, "Location extracted");
                    state.location = Some(location);
                }
                Step::Classify => {
                    let run = self
                        .classifier
                        .classify(&state.transcript)
                        .await
                        .map_err(WorkflowError::collaborator(Collaborator::Classifier))?;
                    state.transcript.extend(run.new_items);
                    let topic = normalize_classification(&run.output);
                    tracing::debug!(topic = %topic, "Topic classified");
                    state.topic = Some(topic);
                }
                Step::Route(Route::Specialist(topic)) => {
                    let run = self
                        .router
                        .specialist(topic)
                        .answer(&state.transcript)
                        .await
                        .map_err(WorkflowError::collaborator(Collaborator::Specialist(topic)))?;
                    state.transcript.extend(run.new_items);
                    state.answer = Some(run.output);
                }
                Step::Route(Route::Unroutable(label)) => {
                    tracing::warn!(classification = %label, "Classification matches no specialist");
                    state.answer = Some(unroutable_answer(&label));
                }
                Step::Finish => {
                    tracing::info!(
                        topic = ?state.topic,
                        location = ?state.location,
                        confirmation = state.topic_from_confirmation,
                        new_items = state.transcript.len() - state.prior_len,
                        "Turn completed"
                    );
                    return Ok(state.into_envelope());
                }
            }
        }
    }
}
