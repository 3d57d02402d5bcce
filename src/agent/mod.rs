pub mod client;
pub mod components;
pub mod extract;

use async_trait::async_trait;
use std::error::Error;
use std::fmt;

use components::ResponseComponent;

#[derive(Debug)]
pub enum AgentError {
    ConfigError(String),
    ConnectionError(String),
    ResponseError(String),
    /// The agent answered but no SQL could be extracted from the response.
    GenerationError(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::ConfigError(msg) => write!(f, "Agent configuration error: {}", msg),
            AgentError::ConnectionError(msg) => write!(f, "Agent connection error: {}", msg),
            AgentError::ResponseError(msg) => write!(f, "Agent response error: {}", msg),
            AgentError::GenerationError(msg) => write!(f, "SQL generation error: {}", msg),
        }
    }
}

impl Error for AgentError {}

/// Seam over the conversational generation service. Each call is a fresh,
/// context-free request; the service streams back a finite sequence of
/// typed UI components.
#[async_trait]
pub trait AgentSource: Send + Sync {
    async fn send_message(&self, message: &str) -> Result<Vec<ResponseComponent>, AgentError>;
}
