//! Chat-completion models used by the agents and the evaluator
//!
//! Every agent in the workflow talks to its model through [`LlmService`].
//! Production services are wrapped in [`LoggingService`] by the registry.

mod error;
mod openai;
mod registry;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::LlmError;
pub use openai::{OpenAIModel, OpenAIService};
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait LlmService: Send + Sync {
    /// One non-streaming chat completion
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// API name of the model, e.g. `gpt-4.1`
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Emits one structured event per completion
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let json_mode = request.response_format == ResponseFormat::JsonObject;
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        let duration_ms = started.elapsed().as_millis();

        match &result {
            Ok(response) => tracing::info!(
                model = %self.model_id,
                duration_ms = %duration_ms,
                json_mode,
                offered_tools = request.tools.len(),
                tool_calls = response.tool_uses().len(),
                end_turn = response.end_turn,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM request completed"
            ),
            Err(e) => tracing::error!(
                model = %self.model_id,
                duration_ms = %duration_ms,
                json_mode,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "LLM request failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
