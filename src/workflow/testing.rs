//! Mock collaborators for testing
//!
//! These mocks record every transcript they are called with and return
//! either queued one-shot results or a sticky default.

use super::router::SpecialistRouter;
use super::topic::Topic;
use super::traits::{AgentError, AgentRun, LocationExtractor, Specialist, TopicClassifier};
use super::TurnOrchestrator;
use crate::llm::LlmError;
use crate::transcript::{Transcript, TurnItem};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock agent with queued results and a sticky fallback
pub struct MockAgent<T: Clone + Send> {
    name: &'static str,
    responses: Mutex<VecDeque<Result<T, AgentError>>>,
    sticky: Mutex<Option<T>>,
    render: fn(&T) -> String,
    /// Record of every transcript passed in
    seen: Mutex<Vec<Transcript>>,
}

impl<T: Clone + Send> MockAgent<T> {
    pub fn new(name: &'static str, render: fn(&T) -> String) -> Self {
        Self {
            name,
            responses: Mutex::new(VecDeque::new()),
            sticky: Mutex::new(None),
            render,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Result returned whenever nothing is queued
    pub fn always(&self, output: T) {
        *self.sticky.lock().unwrap() = Some(output);
    }

    pub fn queue(&self, output: T) {
        self.responses.lock().unwrap().push_back(Ok(output));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Transcript> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self, transcript: &Transcript) -> Result<AgentRun<T>, AgentError> {
        let call = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(transcript.clone());
            seen.len()
        };

        let queued = self.responses.lock().unwrap().pop_front();
        let output = match queued {
            Some(result) => result?,
            None => self
                .sticky
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| LlmError::network("No mock response queued"))?,
        };

        let item = TurnItem::assistant(format!("{}_{call}", self.name), (self.render)(&output));
        Ok(AgentRun::new(output, vec![item]))
    }
}

pub type MockClassifier = MockAgent<String>;
pub type MockLocator = MockAgent<Option<String>>;
pub type MockSpecialist = MockAgent<String>;

pub fn mock_classifier() -> MockClassifier {
    MockAgent::new("cls", |topic| format!(r#"{{"classifier":"{topic}"}}"#))
}

pub fn mock_locator() -> MockLocator {
    MockAgent::new("loc", |location| {
        format!(
            r#"{{"location":"{}"}}"#,
            location.as_deref().unwrap_or_default()
        )
    })
}

pub fn mock_specialist(topic: Topic) -> MockSpecialist {
    MockAgent::new(topic.as_str(), Clone::clone)
}

#[async_trait]
impl TopicClassifier for MockAgent<String> {
    async fn classify(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        self.next(transcript)
    }
}

#[async_trait]
impl Specialist for MockAgent<String> {
    async fn answer(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        self.next(transcript)
    }
}

#[async_trait]
impl LocationExtractor for MockAgent<Option<String>> {
    async fn extract(
        &self,
        transcript: &Transcript,
    ) -> Result<AgentRun<Option<String>>, AgentError> {
        self.next(transcript)
    }
}

/// Builder wiring mocks into a [`TurnOrchestrator`]
pub struct TestWorkflow {
    pub classifier: Arc<MockClassifier>,
    pub locator: Arc<MockLocator>,
    specialists: HashMap<Topic, Arc<MockSpecialist>>,
}

impl TestWorkflow {
    pub fn new() -> Self {
        Self {
            classifier: Arc::new(mock_classifier()),
            locator: Arc::new(mock_locator()),
            specialists: Topic::ALL
                .into_iter()
                .map(|t| (t, Arc::new(mock_specialist(t))))
                .collect(),
        }
    }

    /// Classifier returns `topic` on every call
    pub fn classify(self, topic: &str) -> Self {
        self.classifier.always(topic.to_string());
        self
    }

    /// Locator returns `location` on every call
    pub fn locate(self, location: Option<&str>) -> Self {
        self.locator.always(location.map(String::from));
        self
    }

    /// Specialist for `topic` answers `text` on every call
    pub fn answer(self, topic: Topic, text: &str) -> Self {
        self.specialist(topic).always(text.to_string());
        self
    }

    /// Every specialist answers with a topic-specific default
    pub fn answer_all(self) -> Self {
        for topic in Topic::ALL {
            self.specialist(topic).always(format!("{topic} answer"));
        }
        self
    }

    pub fn specialist(&self, topic: Topic) -> &Arc<MockSpecialist> {
        &self.specialists[&topic]
    }

    pub fn orchestrator(&self) -> TurnOrchestrator {
        let router = SpecialistRouter::from_fn(|topic| {
            let specialist: Arc<dyn Specialist> = self.specialists[&topic].clone();
            specialist
        });
        TurnOrchestrator::new(self.classifier.clone(), self.locator.clone(), router)
    }
}

impl Default for TestWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_agent_queue_then_sticky() {
        let classifier = mock_classifier();
        classifier.queue("water".to_string());
        classifier.always("food".to_string());

        let transcript = Transcript::new();
        assert_eq!(classifier.classify(&transcript).await.unwrap().output, "water");
        assert_eq!(classifier.classify(&transcript).await.unwrap().output, "food");
        assert_eq!(classifier.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_agent_without_response_fails() {
        let locator = mock_locator();
        let result = locator.extract(&Transcript::new()).await;
        assert!(matches!(result, Err(AgentError::Llm(_))));
    }
}
