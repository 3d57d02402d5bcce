use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;

const EMBEDDING_MODEL: &str = "text-embedding-3-small";
const EMBEDDING_DIM: usize = 1536;

#[derive(Debug)]
pub enum EmbeddingError {
    ConfigError(String),
    ConnectionError(String),
    ResponseError(String),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::ConfigError(msg) => write!(f, "Embedding configuration error: {}", msg),
            EmbeddingError::ConnectionError(msg) => {
                write!(f, "Embedding connection error: {}", msg)
            }
            EmbeddingError::ResponseError(msg) => write!(f, "Embedding response error: {}", msg),
        }
    }
}

impl Error for EmbeddingError {}

/// Token usage reported by the provider, for cost tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// Thin client over the provider's embedding endpoint. One batched call
/// per request; output order matches input order.
#[derive(Debug)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            EmbeddingError::ConfigError("API key is required for embedding features".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    /// Embeds a batch of texts. Empty input short-circuits without a
    /// network call.
    pub async fn generate(
        &self,
        texts: &[String],
    ) -> Result<(Vec<Vec<f32>>, Option<EmbeddingUsage>), EmbeddingError> {
        if texts.is_empty() {
            return Ok((Vec::new(), None));
        }

        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ResponseError(format!(
                "Embedding API responded with status code: {}",
                response.status()
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::ResponseError(e.to_string()))?;

        if embedding_response.data.len() != texts.len() {
            return Err(EmbeddingError::ResponseError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embedding_response.data.len()
            )));
        }

        debug!("Generated {} embeddings", embedding_response.data.len());

        let embeddings = embedding_response
            .data
            .into_iter()
            .map(|item| item.embedding)
            .collect();

        Ok((embeddings, embedding_response.usage))
    }

    pub fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn construction_fails_without_api_key() {
        let config = AppConfig::default().embeddings;
        let err = EmbeddingClient::new(&config).unwrap_err();
        assert!(matches!(err, EmbeddingError::ConfigError(_)));
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let mut config = AppConfig::default().embeddings;
        config.api_key = Some("test-key".to_string());
        let client = EmbeddingClient::new(&config).unwrap();

        let (embeddings, usage) = client.generate(&[]).await.unwrap();
        assert!(embeddings.is_empty());
        assert!(usage.is_none());
        assert_eq!(client.dimension(), 1536);
    }
}
