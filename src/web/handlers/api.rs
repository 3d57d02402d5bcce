use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::agent::AgentError;
use crate::embeddings::EmbeddingUsage;
use crate::web::state::AppState;
use crate::workflow::{PendingView, ResolveOutcome, WorkflowError};

// Query types

#[derive(Debug, Deserialize)]
pub struct NlQueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct NlQueryResponse {
    #[serde(flatten)]
    pub query: PendingView,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub approved: bool,
}

// Embedding types

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub model: String,
    pub uptime_seconds: i64,
    pub context_ready: bool,
    pub pending_count: usize,
    pub memory_backend: crate::agent::client::MemoryBackend,
}

// API Implementations

/// Builds the schema context the agent is grounded with. Idempotent;
/// also invoked once at startup.
pub async fn prepare_context(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.workflow.prepare_context().await;
    Json(serde_json::json!({ "status": "ready" }))
}

/// Generates SQL for a natural-language question and parks it behind the
/// approval gate. Nothing executes until the query is resolved.
pub async fn nl_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NlQueryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    info!("NL-query: {}", payload.question);

    let view = state
        .workflow
        .generate_for_approval(&payload.question)
        .await
        .map_err(workflow_error_response)?;

    Ok(Json(NlQueryResponse {
        query: view,
        explanation:
            "This SQL will retrieve data from your database. Please review before approving."
                .to_string(),
    }))
}

/// Approves or rejects a pending query. Outcomes, including not-found and
/// execution failure, are routine results and come back as 200 bodies.
pub async fn resolve_query(
    State(state): State<Arc<AppState>>,
    Path(query_id): Path<String>,
    Json(payload): Json<ResolveRequest>,
) -> Json<ResolveOutcome> {
    info!("Resolving query {} (approved: {})", query_id, payload.approved);
    Json(state.workflow.resolve(&query_id, payload.approved).await)
}

pub async fn list_pending(State(state): State<Arc<AppState>>) -> Json<Vec<PendingView>> {
    Json(state.workflow.list_pending().await)
}

pub async fn embed(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmbedRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(client) = state.embeddings.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Embedding features are not configured".to_string(),
        ));
    };

    let (embeddings, usage) = client.generate(&payload.texts).await.map_err(|e| {
        error!("Embedding request failed: {}", e);
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    Ok(Json(EmbedResponse {
        embeddings,
        dimension: client.dimension(),
        usage,
    }))
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let uptime = chrono::Utc::now() - state.startup_time;

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.agent.model.clone(),
        uptime_seconds: uptime.num_seconds(),
        context_ready: state.workflow.is_ready().await,
        pending_count: state.workflow.pending_count().await,
        memory_backend: state.memory_backend.clone(),
    })
}

fn workflow_error_response(err: WorkflowError) -> (StatusCode, String) {
    match &err {
        WorkflowError::NotReady => (StatusCode::CONFLICT, err.to_string()),
        WorkflowError::Agent(AgentError::GenerationError(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        WorkflowError::Agent(AgentError::ConnectionError(_))
        | WorkflowError::Agent(AgentError::ResponseError(_)) => {
            error!("Agent request failed: {}", err);
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        WorkflowError::Agent(AgentError::ConfigError(_)) => {
            error!("Agent misconfigured: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
