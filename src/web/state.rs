use crate::agent::client::MemoryBackend;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::workflow::ApprovalWorkflow;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub workflow: ApprovalWorkflow,
    /// Absent when no embedding credential is configured; the embed
    /// endpoint answers 503 in that case.
    pub embeddings: Option<EmbeddingClient>,
    pub memory_backend: MemoryBackend,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        workflow: ApprovalWorkflow,
        embeddings: Option<EmbeddingClient>,
        memory_backend: MemoryBackend,
    ) -> Self {
        Self {
            config,
            workflow,
            embeddings,
            memory_backend,
            startup_time: chrono::Utc::now(),
        }
    }
}
