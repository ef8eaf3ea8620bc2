//! profrag Vector - Embedding and vector index clients
//!
//! Provides the OpenAI embedding client used to encode questions and
//! the Pinecone client used to find the closest professors.

pub mod embedding;
pub mod pinecone;

pub use embedding::OpenAiEmbedding;
pub use pinecone::PineconeIndex;

use profrag_core::{AppConfig, EmbeddingClient, Result, VectorIndex};
use std::sync::Arc;

/// Create an embedding client from config
pub fn create_embedding_client(config: &AppConfig) -> Result<Arc<dyn EmbeddingClient>> {
    Ok(Arc::new(OpenAiEmbedding::from_config(&config.openai)?))
}

/// Connect to the vector index described by config
pub async fn connect_vector_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>> {
    Ok(Arc::new(PineconeIndex::connect(&config.pinecone).await?))
}
