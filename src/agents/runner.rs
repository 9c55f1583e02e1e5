//! Single-agent run loop
//!
//! Renders the transcript as chat messages, calls the model, and executes
//! any requested tools until the model answers without tool calls.

use crate::llm::{
    ContentBlock, LlmMessage, LlmRequest, LlmResponse, LlmService, MessageRole, ResponseFormat,
};
use crate::tools::{ToolOutput, ToolRegistry};
use crate::transcript::{Transcript, TurnItem};
use crate::workflow::AgentError;
use serde_json::Value;
use std::sync::Arc;

/// Tool-execution rounds allowed before the run is abandoned
pub const MAX_TOOL_ROUNDS: usize = 5;
pub const MAX_TOKENS: u32 = 2048;
pub const TEMPERATURE: f32 = 1.0;

/// Static configuration of one agent
#[derive(Clone)]
pub struct AgentProfile {
    pub name: String,
    pub instructions: String,
    pub response_format: ResponseFormat,
    pub tools: ToolRegistry,
}

impl AgentProfile {
    /// Agent answering in free text
    pub fn text(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            response_format: ResponseFormat::Text,
            tools: ToolRegistry::empty(),
        }
    }

    /// Agent answering with a single JSON object
    pub fn json(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            response_format: ResponseFormat::JsonObject,
            ..Self::text(name, instructions)
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }
}

/// Final text of a run plus every item it produced
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub text: String,
    pub new_items: Vec<TurnItem>,
}

#[derive(Clone)]
pub struct AgentRunner {
    llm: Arc<dyn LlmService>,
}

impl AgentRunner {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub async fn run(
        &self,
        profile: &AgentProfile,
        transcript: &Transcript,
    ) -> Result<AgentOutput, AgentError> {
        let tools = profile.tools.definitions();
        let mut new_items: Vec<TurnItem> = Vec::new();

        for round in 0..=MAX_TOOL_ROUNDS {
            let request = LlmRequest {
                system: Some(profile.instructions.clone()),
                messages: to_messages(transcript.iter().chain(new_items.iter())),
                tools: tools.clone(),
                max_tokens: Some(MAX_TOKENS),
                temperature: Some(TEMPERATURE),
                response_format: profile.response_format,
                web_search: false,
            };

            let response = self.llm.complete(&request).await?;
            let text = response.text();
            let response_id = response
                .id
                .clone()
                .unwrap_or_else(|| new_item_id("msg"));

            if !text.is_empty() {
                new_items.push(TurnItem::assistant(response_id, text.clone()));
            }

            if !response.has_tool_use() {
                tracing::debug!(agent = %profile.name, rounds = round, "Agent run finished");
                return Ok(AgentOutput { text, new_items });
            }

            if round == MAX_TOOL_ROUNDS {
                break;
            }

            self.execute_tools(profile, &response, &mut new_items).await;
        }

        tracing::warn!(agent = %profile.name, "Agent exceeded tool round limit");
        Err(AgentError::ToolLoopExhausted(MAX_TOOL_ROUNDS))
    }

    async fn execute_tools(
        &self,
        profile: &AgentProfile,
        response: &LlmResponse,
        new_items: &mut Vec<TurnItem>,
    ) {
        for (call_id, name, input) in response.tool_uses() {
            new_items.push(TurnItem::tool_call(
                new_item_id("fc"),
                call_id,
                name,
                input.to_string(),
            ));

            let output = profile
                .tools
                .execute(name, input.clone())
                .await
                .unwrap_or_else(|| ToolOutput::error(format!("Unknown tool: {name}")));

            tracing::info!(
                agent = %profile.name,
                tool = %name,
                success = output.success,
                "Tool executed"
            );

            new_items.push(TurnItem::tool_result(
                new_item_id("fco"),
                call_id,
                output.output,
            ));
        }
    }
}

fn new_item_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Render transcript items as chat messages.
///
/// Consecutive tool calls share one assistant message, and consecutive
/// tool results share one message so each call is answered in order.
pub fn to_messages<'a>(items: impl IntoIterator<Item = &'a TurnItem>) -> Vec<LlmMessage> {
    let mut messages: Vec<LlmMessage> = Vec::new();

    for item in items {
        match item {
            TurnItem::UserText { .. } => messages.push(LlmMessage::user(item.text())),
            TurnItem::SystemHint { .. } => messages.push(LlmMessage {
                role: MessageRole::System,
                content: vec![ContentBlock::text(item.text())],
            }),
            TurnItem::AssistantText { .. } => messages.push(LlmMessage {
                role: MessageRole::Assistant,
                content: vec![ContentBlock::text(item.text())],
            }),
            TurnItem::ToolCall {
                call_id,
                name,
                arguments,
                ..
            } => {
                let input: Value =
                    serde_json::from_str(arguments).unwrap_or_else(|_| serde_json::json!({}));
                let block = ContentBlock::tool_use(call_id, name, input);
                match messages.last_mut() {
                    Some(last) if is_tool_call_message(last) => last.content.push(block),
                    _ => messages.push(LlmMessage {
                        role: MessageRole::Assistant,
                        content: vec![block],
                    }),
                }
            }
            TurnItem::ToolResult {
                call_id, output, ..
            } => {
                let block = ContentBlock::tool_result(call_id, output, false);
                match messages.last_mut() {
                    Some(last) if is_tool_result_message(last) => last.content.push(block),
                    _ => messages.push(LlmMessage {
                        role: MessageRole::User,
                        content: vec![block],
                    }),
                }
            }
        }
    }

    messages
}

/// Assistant message holding only tool calls. Text from an earlier
/// item, possibly another agent's output, is never merged with a call.
fn is_tool_call_message(message: &LlmMessage) -> bool {
    message.role == MessageRole::Assistant
        && message
            .content
            .iter()
            .all(|block| matches!(block, ContentBlock::ToolUse { .. }))
}

fn is_tool_result_message(message: &LlmMessage) -> bool {
    message.role == MessageRole::User
        && message
            .content
            .iter()
            .all(|block| matches!(block, ContentBlock::ToolResult { .. }))
}
