//! Model-backed collaborators
//!
//! Every agent is a profile (instructions, response format, tools) run by
//! the shared [`AgentRunner`] against the configured model.

mod classifier;
mod locator;
mod prompts;
mod runner;
mod specialist;

pub use classifier::LlmClassifier;
pub use locator::LlmLocator;
pub use runner::AgentRunner;
pub use specialist::LlmSpecialist;

use crate::llm::LlmService;
use crate::tools::ToolRegistry;
use crate::workflow::{Specialist, SpecialistRouter, Topic, TurnOrchestrator};
use std::sync::Arc;

/// Wire the classifier, locator and four specialists to one model.
/// Every specialist gets `specialist_tools`; the water specialist gets
/// `water_tools` instead.
pub fn build_orchestrator(
    llm: Arc<dyn LlmService>,
    specialist_tools: &ToolRegistry,
    water_tools: &ToolRegistry,
) -> TurnOrchestrator {
    let runner = AgentRunner::new(llm);

    let router = SpecialistRouter::from_fn(|topic| {
        let tools = if topic == Topic::Water {
            water_tools.clone()
        } else {
            specialist_tools.clone()
        };
        let specialist: Arc<dyn Specialist> =
            Arc::new(LlmSpecialist::new(topic, runner.clone(), tools));
        specialist
    });

    TurnOrchestrator::new(
        Arc::new(LlmClassifier::new(runner.clone())),
        Arc::new(LlmLocator::new(runner)),
        router,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlmService;
    use crate::tools::WebSearchTool;
    use crate::workflow::WorkflowInput;

    #[tokio::test]
    async fn test_full_turn_against_one_model() {
        let llm = Arc::new(MockLlmService::new("gpt-4.1"));
        // Location first, then classification, then the specialist
        llm.queue_text(r#"{"location":"Austin, TX, USA"}"#);
        llm.queue_text(r#"{"classifier":"transport"}"#);
        llm.queue_text("Driving 10 miles emits about 4 kg of CO2.");

        let orchestrator =
            build_orchestrator(llm.clone(), &ToolRegistry::empty(), &ToolRegistry::empty());
        let envelope = orchestrator
            .run(WorkflowInput::new(
                "How much CO2 does driving 10 miles in Austin produce?",
            ))
            .await
            .unwrap();

        assert_eq!(envelope.topic.as_deref(), Some("transport"));
        assert_eq!(envelope.location, "Austin, TX, USA");
        assert_eq!(envelope.answer_text, "Driving 10 miles emits about 4 kg of CO2.");
        assert_eq!(envelope.transcript.len(), 4);

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 3);
        // The specialist saw user, location and classifier items
        assert_eq!(requests[2].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_specialists_are_offered_web_search() {
        let llm = Arc::new(MockLlmService::new("gpt-4.1"));
        llm.queue_text(r#"{"location":"Denver"}"#);
        llm.queue_text(r#"{"classifier":"waste"}"#);
        llm.queue_text("Denver recycles glass curbside.");

        let search = Arc::new(MockLlmService::new("gpt-4o-mini-search-preview"));
        let specialist_tools =
            ToolRegistry::empty().with_tool(Arc::new(WebSearchTool::new(search)));
        let orchestrator =
            build_orchestrator(llm.clone(), &specialist_tools, &ToolRegistry::empty());
        orchestrator
            .run(WorkflowInput::new("Can I recycle glass in Denver?"))
            .await
            .unwrap();

        let requests = llm.recorded_requests();
        assert!(requests[0].tools.is_empty());
        assert!(requests[1].tools.is_empty());
        let offered: Vec<_> = requests[2].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(offered, ["web_search"]);
    }

    #[tokio::test]
    async fn test_malformed_location_aborts_turn() {
        let llm = Arc::new(MockLlmService::new("gpt-4.1"));
        llm.queue_text("Austin, probably");

        let orchestrator =
            build_orchestrator(llm, &ToolRegistry::empty(), &ToolRegistry::empty());
        let result = orchestrator.run(WorkflowInput::new("water in Austin?")).await;

        assert!(result.is_err());
    }
}
