//! profrag RAG - Retrieval-Augmented Generation pipeline
//!
//! Answers questions about professors in four sequential stages:
//! 1. Take the latest message out of the conversation
//! 2. Embed its text
//! 3. Retrieve the closest professors from the vector index
//! 4. Ask the chat model for a ranked recommendation, streaming the answer
//!
//! Each request is independent; the pipeline holds only shared,
//! immutable provider clients.

use profrag_core::{
    split_last_message, AppConfig, ChatClient, EmbeddingClient, Message, RagConfig, Result,
    RetrievalMatch, VectorIndex,
};
use std::sync::Arc;
use std::time::Instant;

pub mod llm;
pub mod prompt;
pub mod relay;

pub use llm::{create_chat_client, OpenAiChatClient};
pub use prompt::{format_matches, PromptBuilder, RESULTS_BANNER, SYSTEM_PROMPT};
pub use relay::{spawn_relay, RelayOutcome, RelaySummary, ResponseStream};

// ============================================================================
// Pipeline
// ============================================================================

/// Professor recommendation pipeline
pub struct ProfessorRag {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatClient>,
    config: RagConfig,
}

impl ProfessorRag {
    /// Create a new pipeline from provider clients
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatClient>,
        config: RagConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            config,
        }
    }

    /// Build the OpenAI and Pinecone clients described by config
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = profrag_vector::create_embedding_client(config)?;
        let chat = create_chat_client(config)?;
        let index = profrag_vector::connect_vector_index(config).await?;
        Ok(Self::new(embedder, index, chat, config.rag.clone()))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// System instructions sent ahead of every conversation
    pub fn system_prompt(&self) -> &str {
        self.config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT)
    }

    /// Embed a question and fetch the closest professors, most similar first
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievalMatch>> {
        let vector = self.embedder.embed(question).await?;
        tracing::debug!(
            model = self.embedder.model(),
            dimension = vector.len(),
            "Question embedded"
        );

        let mut matches = self.index.query(&vector, self.config.top_k).await?;
        matches.truncate(self.config.top_k);
        tracing::debug!(
            index = self.index.name(),
            matches = matches.len(),
            "Professors retrieved"
        );

        Ok(matches)
    }

    /// Build the message list for the chat model from a conversation
    pub async fn augment(&self, messages: &[Message]) -> Result<Vec<Message>> {
        let (last, history) = split_last_message(messages)?;
        let matches = self.retrieve(&last.content).await?;

        let prompt = PromptBuilder::new()
            .system(self.system_prompt())
            .history(history)
            .question(last.content.as_str())
            .retrieved(&matches)
            .build();

        tracing::info!(
            history = history.len(),
            professors = matches.len(),
            prompt_chars = prompt.iter().map(|m| m.content.len()).sum::<usize>(),
            "Augmented prompt built"
        );

        Ok(prompt)
    }

    /// Answer a conversation, streaming fragments as the model produces them.
    ///
    /// Failures before the first fragment are returned directly; later ones
    /// arrive as the final item of the stream.
    pub async fn answer_stream(&self, messages: &[Message]) -> Result<ResponseStream> {
        let start = Instant::now();
        let prompt = self.augment(messages).await?;

        let upstream = self.chat.complete_stream(&prompt).await?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion stream started"
        );

        Ok(spawn_relay(upstream, self.config.relay_buffer))
    }

    /// Answer a conversation with a single buffered response
    pub async fn answer(&self, messages: &[Message]) -> Result<String> {
        let start = Instant::now();
        let prompt = self.augment(messages).await?;

        let answer = self.chat.complete(&prompt).await?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            answer_chars = answer.len(),
            "Completion received"
        );

        Ok(answer)
    }
}

// ============================================================================
// Tests
// ============================================================================
