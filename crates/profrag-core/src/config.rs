//! profrag Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults matching the hosted professor index deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// OpenAI embedding and chat configuration
    pub openai: OpenAiConfig,

    /// Pinecone index configuration
    pub pinecone: PineconeConfig,

    /// RAG pipeline configuration
    pub rag: RagConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load from an optional TOML file with the environment layered on top,
    /// or from the environment alone when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path)?.with_env_override(),
            None => Self::from_env(),
        }
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from a variable lookup onto this config
    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Server
        if let Some(host) = var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        // CORS origins (comma-separated)
        if let Some(origins) = var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // OpenAI
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(model) = var("CHAT_MODEL") {
            self.openai.chat_model = model;
        }
        if let Some(model) = var("EMBEDDING_MODEL") {
            self.openai.embedding_model = model;
        }

        // Pinecone
        if let Some(key) = var("PINECONE_API_KEY") {
            self.pinecone.api_key = Some(key);
        }
        if let Some(index) = var("PINECONE_INDEX") {
            self.pinecone.index_name = index;
        }
        if let Some(namespace) = var("PINECONE_NAMESPACE") {
            self.pinecone.namespace = namespace;
        }
        if let Some(host) = var("PINECONE_INDEX_HOST") {
            self.pinecone.index_host = Some(host);
        }

        // RAG
        if let Some(top_k) = var("RAG_TOP_K") {
            self.rag.top_k = parse_value("RAG_TOP_K", top_k)?;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(self)
    }

    /// Check that everything needed to serve requests is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingRequired("OPENAI_API_KEY".to_string()));
        }
        if self.pinecone.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingRequired("PINECONE_API_KEY".to_string()));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RAG_TOP_K".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: Option<String>,

    /// API base URL (for compatible APIs)
    pub base_url: String,

    /// Chat completion model
    pub chat_model: String,

    /// Embedding model
    pub embedding_model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Pinecone vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// API key
    pub api_key: Option<String>,

    /// Index name
    pub index_name: String,

    /// Namespace within the index
    pub namespace: String,

    /// Data plane host; resolved from the control plane when unset
    pub index_host: Option<String>,

    /// Control plane URL used to describe the index
    pub control_plane_url: String,

    /// Value of the `X-Pinecone-API-Version` header
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "rag".to_string(),
            namespace: "ns1".to_string(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            timeout_secs: 30,
        }
    }
}

/// RAG pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Number of professors retrieved per question
    pub top_k: usize,

    /// Capacity of the channel between the completion stream and the response body
    pub relay_buffer: usize,

    /// Replacement for the built-in system prompt
    pub system_prompt: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            relay_buffer: 32,
            system_prompt: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
