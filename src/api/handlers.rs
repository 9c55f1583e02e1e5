//! HTTP request handlers

use super::types::{
    ChatRequest, ErrorResponse, EvaluationsResponse, ModelsResponse, RunEvalRequest,
    SessionResponse,
};
use super::AppState;
use crate::chat::{ChatError, ChatReply};
use crate::db::DbError;
use crate::evaluation::Grade;
use crate::session::SessionError;
use crate::workflow::WorkflowError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/evaluations", get(list_evaluations))
        .route("/run_eval", post(run_eval))
        .route("/api/models", get(list_models))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .chat
        .chat(req.message.as_deref(), req.session_id.as_deref())
        .await?;
    Ok(Json(reply))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let stored = state
        .chat
        .session(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;

    Ok(Json(SessionResponse {
        session_id: id,
        transcript: stored.record.transcript,
        last_topic: stored.record.last_topic,
        version: stored.version,
    }))
}

// ============================================================
// Evaluations
// ============================================================

async fn list_evaluations(
    State(state): State<AppState>,
) -> Result<Json<EvaluationsResponse>, AppError> {
    let interactions = state.chat.interactions()?;
    Ok(Json(EvaluationsResponse { interactions }))
}

async fn run_eval(
    State(state): State<AppState>,
    Json(req): Json<RunEvalRequest>,
) -> Result<Json<Grade>, AppError> {
    let present = |field: Option<String>| field.filter(|s| !s.is_empty());
    let (Some(id), Some(query), Some(response)) =
        (present(req.id), present(req.query), present(req.response))
    else {
        return Err(AppError::BadRequest("Missing data".to_string()));
    };

    let grade = state.chat.reevaluate(&id, &query, &response).await?;
    Ok(Json(grade))
}

// ============================================================
// Misc
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.available_models(),
        default: state.llm_registry.default_model_id().to_string(),
        evaluator: state.llm_registry.eval_model_id().to_string(),
        search: state.llm_registry.search_model_id().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("ecobot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        let message = err.to_string();
        match err {
            ChatError::EmptyMessage | ChatError::Workflow(WorkflowError::EmptyInput) => {
                AppError::BadRequest(message)
            }
            ChatError::Workflow(WorkflowError::Collaborator { .. })
            | ChatError::Evaluation(_) => AppError::BadGateway(message),
            ChatError::Session(SessionError::Conflict(_)) => AppError::Conflict(message),
            ChatError::Log(DbError::InteractionNotFound(_)) => AppError::NotFound(message),
            ChatError::Session(SessionError::Storage(_))
            | ChatError::Log(_)
            | ChatError::EvaluatorUnavailable => {
                tracing::error!(error = %message, "Request failed");
                AppError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatService;
    use crate::db::Database;
    use crate::evaluation::Evaluator;
    use crate::llm::testing::MockLlmService;
    use crate::llm::{LlmConfig, LlmError, ModelRegistry};
    use crate::session::MemorySessionStore;
    use crate::workflow::testing::TestWorkflow;
    use crate::workflow::{AgentError, Topic};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(wf: &TestWorkflow, evaluator: Option<Evaluator>) -> Router {
        let chat = ChatService::new(
            wf.orchestrator(),
            Arc::new(MemorySessionStore::new()),
            Database::open_in_memory().unwrap(),
            evaluator,
        );
        let registry = Arc::new(ModelRegistry::new(&LlmConfig::default()));
        create_router(AppState::new(chat, registry))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_chat_then_fetch_session() {
        let wf = TestWorkflow::new()
            .classify("food")
            .locate(Some("Austin"))
            .answer(Topic::Food, "Eat more beans.");
        let app = app(&wf, None);

        let (status, body) = send(
            &app,
            "POST",
            "/chat",
            Some(json!({"message": "What should I eat?", "session_id": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output_text"], "Eat more beans.");
        assert_eq!(body["topic"], "food");
        assert_eq!(body["location"], "Austin");
        assert!(body["history"].is_array());
        assert_eq!(body["evaluation"]["fallback"], "No");

        let (status, session) = send(&app, "GET", "/api/sessions/abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["session_id"], "abc");
        assert_eq!(session["last_topic"], "food");
        assert_eq!(session["version"], 1);
        assert_eq!(session["transcript"], body["history"]);

        let (status, log) = send(&app, "GET", "/api/evaluations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(log["interactions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_message_is_bad_request() {
        let wf = TestWorkflow::new();
        let app = app(&wf, None);

        let (status, body) = send(&app, "POST", "/chat", Some(json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No message provided");

        let (status, _) = send(&app, "POST", "/chat", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_bad_gateway() {
        let wf = TestWorkflow::new().classify("water");
        wf.locator
            .queue_error(AgentError::Llm(LlmError::server_error("upstream down")));
        let app = app(&wf, None);

        let (status, body) = send(&app, "POST", "/chat", Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("upstream down"));

        let (status, _) = send(&app, "GET", "/api/sessions/default", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_eval_requires_all_fields() {
        let wf = TestWorkflow::new();
        let app = app(&wf, None);

        let (status, body) = send(
            &app,
            "POST",
            "/run_eval",
            Some(json!({"id": "x", "query": "q"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing data");

        for empty in [
            json!({"id": "", "query": "q", "response": "r"}),
            json!({"id": "x", "query": "", "response": "r"}),
            json!({"id": "x", "query": "q", "response": ""}),
        ] {
            let (status, body) = send(&app, "POST", "/run_eval", Some(empty)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Missing data");
        }
    }

    #[tokio::test]
    async fn test_run_eval_unknown_interaction_is_not_found() {
        let llm = Arc::new(MockLlmService::new("gpt-4o"));
        llm.queue_text(r#"{"fairness_score": 70, "accuracy_score": 80}"#);
        let wf = TestWorkflow::new();
        let app = app(&wf, Some(Evaluator::new(llm)));

        let (status, _) = send(
            &app,
            "POST",
            "/run_eval",
            Some(json!({"id": "missing", "query": "q", "response": "r"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_eval_replaces_logged_evaluation() {
        let llm = Arc::new(MockLlmService::new("gpt-4o"));
        // First grade is consumed by the chat turn, second by run_eval
        llm.queue_text(r#"{"fairness_score": 50, "accuracy_score": 50}"#);
        llm.queue_text(r#"{"fairness_score": 90, "accuracy_score": 85, "compliance": "Yes"}"#);
        let wf = TestWorkflow::new().classify("energy").locate(None).answer_all();
        let app = app(&wf, Some(Evaluator::new(llm)));

        let (_, reply) = send(&app, "POST", "/chat", Some(json!({"message": "Solar?"}))).await;
        let id = reply["interaction_id"].as_str().unwrap().to_string();

        let (status, grade) = send(
            &app,
            "POST",
            "/run_eval",
            Some(json!({"id": id, "query": "Solar?", "response": "energy answer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(grade["fairness_score"], 90.0);

        let (_, log) = send(&app, "GET", "/api/evaluations", None).await;
        assert_eq!(log["interactions"][0]["evaluation"]["fairness_score"], 90.0);
        assert_eq!(log["interactions"][0]["evaluation"]["compliance"], "Yes");
    }

    #[tokio::test]
    async fn test_version_and_models() {
        let wf = TestWorkflow::new();
        let app = app(&wf, None);

        let request = Request::builder().uri("/version").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("ecobot "));

        let (status, models) = send(&app, "GET", "/api/models", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(models["models"], json!([]));
        assert_eq!(models["default"], "gpt-4.1");
        assert_eq!(models["evaluator"], "gpt-4o");
        assert_eq!(models["search"], "gpt-4o-mini-search-preview");
    }
}
