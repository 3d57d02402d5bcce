use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;

use super::components::ResponseComponent;
use super::{AgentError, AgentSource};

/// Embedding dimension of the vector memory index (text-embedding-3-small).
pub const MEMORY_EMBEDDING_DIM: usize = 1536;

/// Where the agent service persists interaction history between calls.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum MemoryBackend {
    /// Vector-indexed store, survives restarts.
    Vector {
        index_name: String,
        dimension: usize,
    },
    /// In-process store, lost on restart.
    Ephemeral,
}

/// Client for the conversational text-to-SQL agent service. Each message
/// is sent as a fresh request; the service's SQL runner executes against
/// the configured database on its side.
#[derive(Debug)]
pub struct AgentClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    database_url: String,
    memory: MemoryBackend,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    message: &'a str,
    database_url: &'a str,
    /// Fresh request context; no conversation carry-over.
    context: serde_json::Map<String, serde_json::Value>,
    memory: &'a MemoryBackend,
}

#[derive(Deserialize)]
struct MessageResponse {
    components: Vec<ResponseComponent>,
}

impl AgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AgentError::ConfigError("API key is required for text-to-SQL features".to_string())
        })?;

        let database_url = config.database_url.clone().ok_or_else(|| {
            AgentError::ConfigError(
                "database URL is required for text-to-SQL features".to_string(),
            )
        })?;

        let memory = match &config.memory_api_key {
            Some(_) => {
                info!(
                    "Using vector memory for the agent (index: {})",
                    config.memory_index
                );
                MemoryBackend::Vector {
                    index_name: config.memory_index.clone(),
                    dimension: MEMORY_EMBEDDING_DIM,
                }
            }
            None => {
                warn!("Using in-memory storage for the agent (history will not persist)");
                MemoryBackend::Ephemeral
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AgentError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            database_url,
            memory,
        })
    }

    pub fn memory_backend(&self) -> &MemoryBackend {
        &self.memory
    }
}

#[async_trait]
impl AgentSource for AgentClient {
    async fn send_message(&self, message: &str) -> Result<Vec<ResponseComponent>, AgentError> {
        let request = MessageRequest {
            model: &self.model,
            message,
            database_url: &self.database_url,
            context: serde_json::Map::new(),
            memory: &self.memory,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::ResponseError(format!(
                "Agent API responded with status code: {}",
                response.status()
            )));
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseError(e.to_string()))?;

        debug!(
            "Agent returned {} response components",
            message_response.components.len()
        );

        Ok(message_response.components)
    }
}

/// Message asking the agent to run an already-approved statement.
pub fn execute_prompt(sql: &str) -> String {
    format!("Execute this SQL query:\n\n```sql\n{}\n```", sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn agent_config() -> AgentConfig {
        let mut config = AppConfig::default().agent;
        config.api_key = Some("test-key".to_string());
        config.database_url = Some("postgres://localhost/shop".to_string());
        config
    }

    #[test]
    fn construction_fails_without_api_key() {
        let mut config = agent_config();
        config.api_key = None;
        let err = AgentClient::new(&config).unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }

    #[test]
    fn construction_fails_without_database_url() {
        let mut config = agent_config();
        config.database_url = None;
        let err = AgentClient::new(&config).unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }

    #[test]
    fn memory_backend_follows_credential() {
        let client = AgentClient::new(&agent_config()).unwrap();
        assert_eq!(client.memory_backend(), &MemoryBackend::Ephemeral);

        let mut config = agent_config();
        config.memory_api_key = Some("mem-key".to_string());
        let client = AgentClient::new(&config).unwrap();
        assert!(matches!(
            client.memory_backend(),
            MemoryBackend::Vector { dimension: 1536, .. }
        ));
    }

    #[test]
    fn execute_prompt_wraps_sql_in_fence() {
        let prompt = execute_prompt("SELECT 1;");
        assert!(prompt.starts_with("Execute this SQL query:"));
        assert!(prompt.contains("```sql\nSELECT 1;\n```"));
    }
}
