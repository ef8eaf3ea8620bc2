//! profrag Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout profrag:
//! - Conversation models (roles, messages)
//! - Retrieval results from the professor index
//! - Common error types
//! - Provider traits for embedding, vector search, and chat completion
//! - Configuration management

pub mod config;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{
    AppConfig, ConfigError, LoggingConfig, OpenAiConfig, PineconeConfig, RagConfig, ServerConfig,
};

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for profrag operations
#[derive(Error, Debug)]
pub enum ProfError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProfError {
    /// Whether the failure came from an external provider
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError(_) | Self::RetrievalError(_) | Self::LlmError(_)
        )
    }
}

impl From<ConfigError> for ProfError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProfError>;

// ============================================================================
// Conversation Models
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Split a conversation into its active query and the preceding history.
///
/// The last message is returned unchanged together with the in-order prefix.
/// An empty conversation has no query and is rejected.
pub fn split_last_message(messages: &[Message]) -> Result<(&Message, &[Message])> {
    messages
        .split_last()
        .ok_or_else(|| ProfError::InvalidInput("conversation must not be empty".to_string()))
}

// ============================================================================
// Retrieval Models
// ============================================================================

/// Metadata stored alongside each professor vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessorMetadata {
    /// Subject taught
    #[serde(default)]
    pub subject: String,

    /// Average rating, out of 5
    #[serde(default)]
    pub stars: f64,
}

/// A professor returned by the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// Professor name (the vector id)
    pub id: String,

    /// Similarity score reported by the index
    #[serde(default)]
    pub score: f32,

    #[serde(default)]
    pub metadata: ProfessorMetadata,
}

impl RetrievalMatch {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, stars: f64) -> Self {
        Self {
            id: id.into(),
            score: 0.0,
            metadata: ProfessorMetadata {
                subject: subject.into(),
                stars,
            },
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for embedding providers
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Trait for nearest-neighbour search over the professor index
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches, most similar first, with metadata
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>>;

    /// Index name, for logging
    fn name(&self) -> &str;
}

/// Trait for chat completion providers
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Stream completion fragments in the order the provider produces them
    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<String>>>;

    /// Generate a complete response
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let mut stream = self.complete_stream(messages).await?;
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            answer.push_str(&fragment?);
        }
        Ok(answer)
    }
}

// ============================================================================
// Tests
// ============================================================================
