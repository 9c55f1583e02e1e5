//! Web search tool
//!
//! Hands the query to a search model and returns its answer followed by the
//! pages it cited.

use super::{Tool, ToolOutput};
use crate::llm::{LlmMessage, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::Arc;

const MAX_TOKENS: u32 = 1024;

pub struct WebSearchTool {
    llm: Arc<dyn LlmService>,
}

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
}

impl WebSearchTool {
    /// `llm` must be a model that accepts web search options
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

fn format_answer(response: &LlmResponse) -> String {
    let mut out = response.text();
    if !response.citations.is_empty() {
        out.push_str("\n\nSources:");
        for citation in &response.citations {
            let _ = if citation.title.is_empty() {
                write!(out, "\n- {}", citation.url)
            } else {
                write!(out, "\n- {}: {}", citation.title, citation.url)
            };
        }
    }
    out
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> String {
        "Search the web for current information, sources to cite, or the latitude/longitude of a place. Returns a short answer and the pages it came from.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                }
            }
        })
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: WebSearchInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };
        let query = input.query.trim();
        if query.is_empty() {
            return ToolOutput::error("Invalid input: empty query");
        }

        let request = LlmRequest {
            messages: vec![LlmMessage::user(query)],
            max_tokens: Some(MAX_TOKENS),
            web_search: true,
            ..Default::default()
        };

        match self.llm.complete(&request).await {
            Ok(response) => {
                tracing::debug!(
                    query,
                    citations = response.citations.len(),
                    "Web search completed"
                );
                ToolOutput::success(format_answer(&response))
            }
            Err(e) => {
                tracing::warn!(error = %e, query, "Web search failed");
                ToolOutput::error(format!("Error searching the web: {e}"))
            }
        }
    }
}
