//! Chat completion client
//!
//! Talks to the OpenAI chat completions API with support for both
//! buffered and streaming responses. Streams arrive as server-sent
//! events and are decoded line by line, so events split across
//! network chunks are reassembled before parsing.

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use profrag_core::{AppConfig, ChatClient, Message, OpenAiConfig, ProfError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI chat completions client
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamFailure>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamFailure {
    message: String,
}

/// One decoded line of a completion stream
#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Fragment(String),
    Done,
    Skip,
}

impl OpenAiChatClient {
    /// Create a new OpenAI chat client
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

        // No total timeout: a streamed answer may legitimately outlive it.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProfError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
        })
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: stream.then_some(true),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProfError::LlmError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProfError::LlmError(format!(
                "OpenAI error ({status}): {error_text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let response = self.send(messages, true).await?;
        tracing::debug!(model = %self.model, "Completion stream opened");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let lines = FramedRead::new(StreamReader::new(body), LinesCodec::new());

        let fragments = lines
            .map(|line| match line {
                Ok(line) => parse_sse_line(&line),
                Err(e) => Err(ProfError::StreamError(format!(
                    "Failed to read completion stream: {e}"
                ))),
            })
            .take_while(|event| future::ready(!matches!(event, Ok(SseEvent::Done))))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(SseEvent::Fragment(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let response = self.send(messages, false).await?;

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProfError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProfError::LlmError("No response generated".to_string()))
    }
}

/// Decode a single server-sent event line
fn parse_sse_line(line: &str) -> Result<SseEvent> {
    let Some(data) = line.strip_prefix("data:") else {
        // Blank separators, comments, and event/id fields carry no content
        return Ok(SseEvent::Skip);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| ProfError::StreamError(format!("Malformed stream chunk: {e}")))?;

    if let Some(failure) = chunk.error {
        return Err(ProfError::StreamError(failure.message));
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
    {
        Some(content) if !content.is_empty() => Ok(SseEvent::Fragment(content)),
        _ => Ok(SseEvent::Skip),
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create a chat client from config
pub fn create_chat_client(config: &AppConfig) -> Result<Arc<dyn ChatClient>> {
    Ok(Arc::new(OpenAiChatClient::from_config(&config.openai)?))
}

// ============================================================================
// Tests
// ============================================================================
