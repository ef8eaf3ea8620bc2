//! Embedding client for turning questions into query vectors
//!
//! Talks to the OpenAI embeddings API (or any compatible endpoint).

use async_trait::async_trait;
use profrag_core::{EmbeddingClient, OpenAiConfig, ProfError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| ProfError::ConfigError("OpenAI API key required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProfError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProfError::EmbeddingError(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProfError::EmbeddingError(format!(
                "OpenAI embedding error ({status}): {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            ProfError::EmbeddingError(format!("Failed to parse embedding response: {e}"))
        })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProfError::EmbeddingError("No embedding returned".to_string()))?;

        tracing::debug!(
            model = %self.model,
            dimension = embedding.len(),
            "Embedding generated"
        );

        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_from_config_requires_key() {
        let config = OpenAiConfig::default();
        assert!(matches!(
            OpenAiEmbedding::from_config(&config),
            Err(ProfError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_config_uses_embedding_model() {
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:1234/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiEmbedding::from_config(&config).unwrap();
        assert_eq!(client.model(), "text-embedding-3-small");
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }

    #[tokio::test]
    async fn test_embed_requests_float_encoding() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": "best professor for algorithms?",
                "encoding_format": "float"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"object": "embedding", "index": 0, "embedding": [0.25, -0.5, 1.0]}],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiEmbedding::new("sk-test", "text-embedding-3-small")
            .with_base_url(server.uri());
        let vector = client.embed("best professor for algorithms?").await.unwrap();

        assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiEmbedding::new("bad", "text-embedding-3-small")
            .with_base_url(server.uri());
        let err = client.embed("q").await.unwrap_err();

        match err {
            ProfError::EmbeddingError(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_empty_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let client = OpenAiEmbedding::new("sk", "m").with_base_url(server.uri());
        assert!(matches!(
            client.embed("q").await,
            Err(ProfError::EmbeddingError(_))
        ));
    }
}
