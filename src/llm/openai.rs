//! `OpenAI` chat completions client
//!
//! Agents send a system instruction, the transcript as chat messages and,
//! for the specialists, function tools. Classifier, locator and evaluator
//! requests ask for a JSON object response. Web searches go to the search
//! preview models, which answer with `url_citation` annotations.

use super::types::{
    Citation, ContentBlock, LlmMessage, LlmRequest, LlmResponse, MessageRole, ResponseFormat,
    Usage,
};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Chat models the agents can be pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIModel {
    GPT41,
    GPT41Mini,
    GPT4o,
    GPT4oMini,
    GPT4oSearchPreview,
    GPT4oMiniSearchPreview,
}

impl OpenAIModel {
    pub const ALL: [OpenAIModel; 6] = [
        OpenAIModel::GPT41,
        OpenAIModel::GPT41Mini,
        OpenAIModel::GPT4o,
        OpenAIModel::GPT4oMini,
        OpenAIModel::GPT4oSearchPreview,
        OpenAIModel::GPT4oMiniSearchPreview,
    ];

    pub fn api_name(self) -> &'static str {
        match self {
            OpenAIModel::GPT41 => "gpt-4.1",
            OpenAIModel::GPT41Mini => "gpt-4.1-mini",
            OpenAIModel::GPT4o => "gpt-4o",
            OpenAIModel::GPT4oMini => "gpt-4o-mini",
            OpenAIModel::GPT4oSearchPreview => "gpt-4o-search-preview",
            OpenAIModel::GPT4oMiniSearchPreview => "gpt-4o-mini-search-preview",
        }
    }
}

pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: OpenAIModel,
    endpoint: String,
}

impl OpenAIService {
    /// With a gateway, requests go to `{gateway}/openai/v1/chat/completions`
    pub fn new(api_key: String, model: OpenAIModel, gateway: Option<&str>) -> Self {
        let endpoint = gateway.map_or_else(
            || OPENAI_CHAT_URL.to_string(),
            |gw| format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/')),
        );

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            model,
            endpoint,
        }
    }

    fn build_body<'a>(&self, request: &'a LlmRequest) -> ChatCompletionBody<'a> {
        let instructions = request
            .system
            .iter()
            .map(|text| WireMessage::text(WireRole::System, text.clone()));
        let conversation = request.messages.iter().flat_map(wire_messages);

        ChatCompletionBody {
            model: self.model.api_name(),
            messages: instructions.chain(conversation).collect(),
            tools: request
                .tools
                .iter()
                .map(|tool| WireTool {
                    kind: "function",
                    function: WireFunction {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.input_schema,
                    },
                })
                .collect(),
            max_tokens: request.max_tokens,
            // Search models reject sampling parameters
            temperature: request.temperature.filter(|_| !request.web_search),
            web_search_options: request.web_search.then_some(WireWebSearchOptions {}),
            response_format: (request.response_format == ResponseFormat::JsonObject)
                .then_some(WireResponseFormat {
                    kind: "json_object",
                }),
        }
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map_or(body, |parsed| parsed.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let completion: ChatCompletion = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;
        completion.into_response()
    }

    fn model_id(&self) -> &str {
        self.model.api_name()
    }
}

fn send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        LlmError::network(format!("Connection failed: {e}"))
    } else {
        LlmError::unknown(format!("Request failed: {e}"))
    }
}

/// One transcript message may expand to several chat messages: tool
/// results each travel as their own `tool` message after any text.
fn wire_messages(message: &LlmMessage) -> Vec<WireMessage> {
    let role = match message.role {
        MessageRole::User => WireRole::User,
        MessageRole::System => WireRole::System,
        MessageRole::Assistant => WireRole::Assistant,
    };

    let mut text = Vec::new();
    let mut tool_calls = Vec::new();
    let mut results = Vec::new();
    for block in &message.content {
        match block {
            ContentBlock::Text { text: t } => text.push(t.as_str()),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(WireToolCall {
                id: id.clone(),
                kind: "function".to_string(),
                function: WireFunctionCall {
                    name: name.clone(),
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => results.push(WireMessage {
                role: WireRole::Tool,
                content: Some(if *is_error {
                    format!("Error: {content}")
                } else {
                    content.clone()
                }),
                tool_calls: Vec::new(),
                tool_call_id: Some(tool_use_id.clone()),
                annotations: Vec::new(),
            }),
        }
    }

    let mut out = Vec::with_capacity(results.len() + 1);
    if !text.is_empty() || !tool_calls.is_empty() {
        out.push(WireMessage {
            role,
            content: (!text.is_empty()).then(|| text.join("\n")),
            tool_calls,
            tool_call_id: None,
            annotations: Vec::new(),
        });
    }
    out.extend(results);
    if out.is_empty() {
        out.push(WireMessage::text(role, String::new()));
    }
    out
}

impl ChatCompletion {
    fn into_response(self) -> Result<LlmResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let citations = choice
            .message
            .annotations
            .into_iter()
            .filter_map(|a| a.url_citation)
            .map(|c| Citation {
                title: c.title,
                url: c.url,
            })
            .collect();

        let text = choice
            .message
            .content
            .filter(|t| !t.is_empty())
            .map(|text| ContentBlock::Text { text });

        let calls = choice
            .message
            .tool_calls
            .into_iter()
            .filter(|call| !call.function.name.is_empty())
            .map(|call| {
                let input = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                    tracing::warn!(
                        error = %e,
                        tool = %call.function.name,
                        "Unparseable tool call arguments"
                    );
                    Value::Object(serde_json::Map::new())
                });
                ContentBlock::ToolUse {
                    id: call.id,
                    name: call.function.name,
                    input,
                }
            });

        Ok(LlmResponse {
            id: self.id,
            content: text.into_iter().chain(calls).collect(),
            end_turn: choice.finish_reason.as_deref() == Some("stop"),
            usage: Usage {
                input_tokens: self.usage.prompt_tokens,
                output_tokens: self.usage.completion_tokens,
            },
            citations,
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'static str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search_options: Option<WireWebSearchOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

/// Serialized as `{}`: default search context size, no user location
#[derive(Debug, Serialize)]
struct WireWebSearchOptions {}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: WireRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing)]
    annotations: Vec<WireAnnotation>,
}

impl WireMessage {
    fn text(role: WireRole, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireAnnotation {
    #[serde(default)]
    url_citation: Option<WireUrlCitation>,
}

#[derive(Debug, Deserialize)]
struct WireUrlCitation {
    url: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    id: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
