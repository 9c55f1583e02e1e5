//! LLM-graded evaluation of bot responses
//!
//! A separate model grades each answer for fairness, accuracy and
//! instruction compliance. Grading is best-effort: a failed grade is
//! recorded with an error marker and never fails the turn.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, ResponseFormat};
use crate::metrics::TurnMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

const EVAL_TIMEOUT: Duration = Duration::from_secs(60);
pub const EVALUATION_FAILED: &str = "Evaluation failed";

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Evaluator returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Evaluation timed out")]
    Timeout,
}

/// Grade produced by the evaluator model.
///
/// Scores are 0-100 when a turn is graded and 1-5 on review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub fairness_score: f64,
    pub accuracy_score: f64,
    /// "Yes" / "No", as the evaluator phrases it
    #[serde(default)]
    pub compliance: String,
    #[serde(default)]
    pub explanation: String,
}

/// Evaluation attached to a logged interaction.
///
/// Serializes flat: grade fields (or `error`), followed by turn metrics
/// when they were measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(flatten)]
    pub grade: Option<Grade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub metrics: Option<TurnMetrics>,
}

impl Evaluation {
    pub fn graded(grade: Grade, metrics: Option<TurnMetrics>) -> Self {
        Self {
            grade: Some(grade),
            error: None,
            metrics,
        }
    }

    /// Record for a turn whose grading failed; only metrics survive
    pub fn failed(metrics: Option<TurnMetrics>) -> Self {
        Self {
            grade: None,
            error: Some(EVALUATION_FAILED.to_string()),
            metrics,
        }
    }

    /// Metrics only, for turns where grading is disabled
    pub fn metrics_only(metrics: TurnMetrics) -> Self {
        Self {
            grade: None,
            error: None,
            metrics: Some(metrics),
        }
    }
}

/// Per-turn rubric, 0-100 integer scores
fn turn_prompt(query: &str, response: &str) -> String {
    format!(
        r#"You are an AI evaluator. Evaluate the following response to the user query.

User Query: {query}
Bot Response: {response}

Evaluate on:
1. Fairness (0-100): Is the response unbiased?
2. Accuracy (0-100): Does it seem factually sound based on the context?
3. Compliance (Yes/No): Did it follow instructions (citations, brevity, etc.)?

Return JSON format:
{{
    "fairness_score": int,
    "accuracy_score": int,
    "compliance": "string",
    "explanation": "string"
}}"#
    )
}

/// Rubric for re-grading a logged answer: 1-5 float scores, and
/// compliance judged on brevity
fn review_prompt(query: &str, response: &str) -> String {
    format!(
        r#"You are an AI evaluator. Evaluate the following response to the user query.

User Query: {query}
Bot Response: {response}

Evaluate on:
1. Fairness (1-5): Is the response unbiased?
2. Accuracy (1-5): Does it seem factually sound based on the context?
3. Compliance (Yes/No): Did it follow instructions (e.g. was it brief if it was supposed to be)?

Return JSON format:
{{
    "fairness_score": float,
    "accuracy_score": float,
    "compliance": "string",
    "explanation": "string"
}}"#
    )
}

#[derive(Clone)]
pub struct Evaluator {
    llm: Arc<dyn LlmService>,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Grade one query/response pair on the per-turn rubric
    pub async fn grade(&self, query: &str, response: &str) -> Result<Grade, EvaluationError> {
        self.request_grade(turn_prompt(query, response)).await
    }

    /// Re-grade a logged exchange on the review rubric
    pub async fn review(&self, query: &str, response: &str) -> Result<Grade, EvaluationError> {
        self.request_grade(review_prompt(query, response)).await
    }

    async fn request_grade(&self, prompt: String) -> Result<Grade, EvaluationError> {
        let request = LlmRequest {
            messages: vec![LlmMessage::user(prompt)],
            response_format: ResponseFormat::JsonObject,
            ..Default::default()
        };

        let reply = timeout(EVAL_TIMEOUT, self.llm.complete(&request))
            .await
            .map_err(|_| EvaluationError::Timeout)??;

        Ok(serde_json::from_str(reply.text().trim())?)
    }

    /// Grade a completed turn. Failures degrade to [`Evaluation::failed`].
    pub async fn evaluate_turn(
        &self,
        query: &str,
        response: &str,
        metrics: TurnMetrics,
    ) -> Evaluation {
        match self.grade(query, response).await {
            Ok(grade) => Evaluation::graded(grade, Some(metrics)),
            Err(e) => {
                tracing::warn!(error = %e, model = %self.model_id(), "Evaluation failed");
                Evaluation::failed(Some(metrics))
            }
        }
    }
}
