//! Model-backed topic specialists

use super::prompts::specialist_instructions;
use super::runner::{AgentProfile, AgentRunner};
use crate::tools::ToolRegistry;
use crate::transcript::Transcript;
use crate::workflow::{AgentError, AgentRun, Specialist, Topic};
use async_trait::async_trait;

pub struct LlmSpecialist {
    topic: Topic,
    runner: AgentRunner,
    profile: AgentProfile,
}

impl LlmSpecialist {
    pub fn new(topic: Topic, runner: AgentRunner, tools: ToolRegistry) -> Self {
        let name = match topic {
            Topic::Food => "Food",
            Topic::Water => "Water",
            Topic::Transport => "Transport",
            Topic::Energy => "Energy",
        };
        Self {
            topic,
            runner,
            profile: AgentProfile::text(name, specialist_instructions(topic)).with_tools(tools),
        }
    }
}

#[async_trait]
impl Specialist for LlmSpecialist {
    async fn answer(&self, transcript: &Transcript) -> Result<AgentRun<String>, AgentError> {
        let out = self.runner.run(&self.profile, transcript).await?;
        tracing::debug!(topic = %self.topic, chars = out.text.len(), "Specialist answered");
        Ok(AgentRun::new(out.text, out.new_items))
    }
}
