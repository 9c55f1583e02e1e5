//! Model-backed location extractor

use super::prompts::LOCATION_INSTRUCTIONS;
use super::runner::{AgentProfile, AgentRunner};
use crate::transcript::Transcript;
use crate::workflow::{AgentError, AgentRun, LocationExtractor};
use async_trait::async_trait;
use serde::Deserialize;

pub struct LlmLocator {
    runner: AgentRunner,
    profile: AgentProfile,
}

impl LlmLocator {
    pub fn new(runner: AgentRunner) -> Self {
        Self {
            runner,
            profile: AgentProfile::json("Location Verification", LOCATION_INSTRUCTIONS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationOutput {
    #[serde(default)]
    location: Option<String>,
}

fn parse_location(text: &str) -> Result<Option<String>, AgentError> {
    serde_json::from_str::<LocationOutput>(text.trim())
        .map(|parsed| parsed.location)
        .map_err(|e| AgentError::MalformedOutput(format!("location output: {e}")))
}

#[async_trait]
impl LocationExtractor for LlmLocator {
    async fn extract(
        &self,
        transcript: &Transcript,
    ) -> Result<AgentRun<Option<String>>, AgentError> {
        let out = self.runner.run(&self.profile, transcript).await?;
        let location = parse_location(&out.text)?;
        Ok(AgentRun::new(location, out.new_items))
    }
}
