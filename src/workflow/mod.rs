use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::agent::client::execute_prompt;
use crate::agent::components::Row;
use crate::agent::extract::{extract_rows, extract_sql};
use crate::agent::{AgentError, AgentSource};
use crate::schema_context::SchemaContextBuilder;

#[derive(Debug)]
pub enum WorkflowError {
    /// Generation requested before the schema context was prepared.
    NotReady,
    Agent(AgentError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::NotReady => {
                write!(f, "Schema context not prepared. Call prepare_context() first.")
            }
            WorkflowError::Agent(e) => write!(f, "{}", e),
        }
    }
}

impl Error for WorkflowError {}

impl From<AgentError> for WorkflowError {
    fn from(e: AgentError) -> Self {
        WorkflowError::Agent(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    PendingApproval,
    Executed,
    Rejected,
    Error,
}

/// A generated statement awaiting human approval. Exists in the store iff
/// it has not been resolved; terminal statuses remove the entry.
#[derive(Debug, Clone)]
struct PendingQuery {
    question: String,
    sql: String,
    generated_at: DateTime<Utc>,
}

/// Read-only view of a pending entry, as returned to the host layer.
#[derive(Debug, Clone, Serialize)]
pub struct PendingView {
    pub query_id: String,
    pub question: String,
    pub sql: String,
    pub status: QueryStatus,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of resolving a pending query. Not-found and execution failure
/// are routine results of a user-facing approval flow, so they are values
/// here, never errors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Rejected {
        query_id: String,
        message: String,
    },
    Executed {
        query_id: String,
        question: String,
        sql: String,
        results: Vec<Row>,
        result_count: usize,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        query_id: Option<String>,
        error: String,
    },
}

/// Approval-gated query lifecycle: generate SQL from a question, hold it
/// for explicit human confirmation, then execute or discard it. The gate
/// is the safety property; nothing runs without a resolve(approved=true).
pub struct ApprovalWorkflow {
    source: Box<dyn AgentSource>,
    context_builder: SchemaContextBuilder,
    schema_context: RwLock<Option<String>>,
    pending: Mutex<HashMap<String, PendingQuery>>,
}

impl ApprovalWorkflow {
    pub fn new(source: Box<dyn AgentSource>) -> Self {
        Self {
            source,
            context_builder: SchemaContextBuilder::new(),
            schema_context: RwLock::new(None),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Builds and caches the schema context. Idempotent; repeated calls
    /// keep the already-built context.
    pub async fn prepare_context(&self) {
        let mut context = self.schema_context.write().await;
        if context.is_some() {
            debug!("Schema context already prepared");
            return;
        }

        *context = Some(self.context_builder.build());
        info!("Schema context prepared for the generation agent");
    }

    pub async fn is_ready(&self) -> bool {
        self.schema_context.read().await.is_some()
    }

    /// Generates SQL for a question and stores it pending approval.
    ///
    /// Nothing is stored until extraction succeeds, so an abandoned or
    /// failed request leaves no entry behind.
    pub async fn generate_for_approval(
        &self,
        question: &str,
    ) -> Result<PendingView, WorkflowError> {
        let prompt = {
            let context = self.schema_context.read().await;
            let context = context.as_deref().ok_or(WorkflowError::NotReady)?;
            format!("{}\n\nQUESTION: {}", context, question)
        };

        // Network-bound; runs outside any lock.
        let components = self.source.send_message(&prompt).await?;
        let sql = extract_sql(components)?;

        let query_id = Uuid::new_v4().to_string();
        let generated_at = Utc::now();

        let mut pending = self.pending.lock().await;
        pending.insert(
            query_id.clone(),
            PendingQuery {
                question: question.to_string(),
                sql: sql.clone(),
                generated_at,
            },
        );

        info!("Stored pending query {} awaiting approval", query_id);

        Ok(PendingView {
            query_id,
            question: question.to_string(),
            sql,
            status: QueryStatus::PendingApproval,
            generated_at,
        })
    }

    /// Resolves a pending query: rejection discards it, approval executes
    /// it through the agent. The entry is consumed up front, so racing
    /// resolvers serialize on the lock and the loser observes not-found;
    /// an execution failure does not reinstate it.
    pub async fn resolve(&self, query_id: &str, approved: bool) -> ResolveOutcome {
        let entry = {
            let mut pending = self.pending.lock().await;
            pending.remove(query_id)
        };

        let Some(entry) = entry else {
            debug!("Resolve requested for unknown query id {}", query_id);
            return ResolveOutcome::Error {
                query_id: None,
                error: "not found".to_string(),
            };
        };

        if !approved {
            info!("Query {} rejected by user", query_id);
            return ResolveOutcome::Rejected {
                query_id: query_id.to_string(),
                message: "Query execution cancelled by user".to_string(),
            };
        }

        info!("Query {} approved, executing", query_id);

        match self.source.send_message(&execute_prompt(&entry.sql)).await {
            Ok(components) => {
                let results = extract_rows(components);
                let result_count = results.len();
                ResolveOutcome::Executed {
                    query_id: query_id.to_string(),
                    question: entry.question,
                    sql: entry.sql,
                    results,
                    result_count,
                }
            }
            // No retry and no re-queue; the approval was spent.
            Err(e) => ResolveOutcome::Error {
                query_id: Some(query_id.to_string()),
                error: e.to_string(),
            },
        }
    }

    /// Snapshot of the queries currently awaiting approval.
    pub async fn list_pending(&self) -> Vec<PendingView> {
        let pending = self.pending.lock().await;
        pending
            .iter()
            .map(|(id, entry)| PendingView {
                query_id: id.clone(),
                question: entry.question.clone(),
                sql: entry.sql.clone(),
                status: QueryStatus::PendingApproval,
                generated_at: entry.generated_at,
            })
            .collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
