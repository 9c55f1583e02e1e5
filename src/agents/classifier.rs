//! Model-backed topic classifier

use super::prompts::CLASSIFIER_INSTRUCTIONS;
use super::runner::{AgentProfile, AgentRunner};
use crate::transcript::Transcript;
use crate::workflow::{AgentError, AgentRun, TopicClassifier};
use async_trait::async_trait;
use serde::Deserialize;

pub struct LlmClassifier {
    runner: AgentRunner,
    profile: AgentProfile,
}

impl LlmClassifier {
    pub fn new(runner: AgentRunner) -> Self {
        Self {
            runner,
            profile: AgentProfile::json("Topic Classifier", CLASSIFIER_INSTRUCTIONS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierOutput {
    classifier: String,
}

/// Extract the topic token. Anything that is not the expected JSON object
/// is taken as the token itself, so a stray reply routes as unroutable.
fn parse_classification(text: &str) -> String {
    let text = text.trim();
    match serde_json::from_str::<ClassifierOutput>(text) {
        Ok(parsed) => parsed.classifier,
        Err(_) => text.to_string(),
    }
}

#[async_trait]
impl TopicClassifier for LlmClassifier {
    async fn classify(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        let out = self.runner.run(&self.profile, transcript).await?;
        Ok(AgentRun::new(parse_classification(&out.text), out.new_items))
    }
}
