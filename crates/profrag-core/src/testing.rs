//! In-memory providers for exercising the pipeline without network access
//!
//! Every mock counts its calls so tests can assert which stages ran.

use crate::{ChatClient, EmbeddingClient, Message, ProfError, Result, RetrievalMatch, VectorIndex};
use futures::stream::{self, BoxStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embedder that returns a fixed vector, or fails when configured to
pub struct StaticEmbedder {
    vector: Vec<f32>,
    fail: bool,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail: false,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts passed to `embed`, in call order
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

impl Default for StaticEmbedder {
    fn default() -> Self {
        Self::new(vec![0.1, 0.2, 0.3])
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(text.to_string());
        }
        if self.fail {
            return Err(ProfError::EmbeddingError("mock embedder failure".to_string()));
        }
        Ok(self.vector.clone())
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}

/// Index that returns a fixed match list
pub struct StaticIndex {
    matches: Vec<RetrievalMatch>,
    fail: bool,
    calls: AtomicUsize,
    last_top_k: AtomicUsize,
}

impl StaticIndex {
    pub fn new(matches: Vec<RetrievalMatch>) -> Self {
        Self {
            matches,
            fail: false,
            calls: AtomicUsize::new(0),
            last_top_k: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `top_k` requested by the most recent query
    pub fn last_top_k(&self) -> usize {
        self.last_top_k.load(Ordering::SeqCst)
    }
}

impl Default for StaticIndex {
    fn default() -> Self {
        Self::new(vec![RetrievalMatch::new("Dr. X", "Algorithms", 5.0)])
    }
}

#[async_trait::async_trait]
impl VectorIndex for StaticIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_top_k.store(top_k, Ordering::SeqCst);
        if self.fail {
            return Err(ProfError::RetrievalError("mock index failure".to_string()));
        }
        Ok(self.matches.clone())
    }

    fn name(&self) -> &str {
        "mock-index"
    }
}

/// Chat provider that replays a script of fragments and errors
pub struct ScriptedChat {
    script: Vec<std::result::Result<String, String>>,
    fail_on_request: bool,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl ScriptedChat {
    /// Replays the given fragments, then ends the stream
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: fragments.into_iter().map(|f| Ok(f.into())).collect(),
            fail_on_request: false,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Appends a mid-stream failure after the scripted fragments
    pub fn then_error(mut self, message: impl Into<String>) -> Self {
        self.script.push(Err(message.into()));
        self
    }

    /// Rejects the completion request before any fragment is produced
    pub fn failing() -> Self {
        Self {
            fail_on_request: true,
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages submitted with the most recent request
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Default for ScriptedChat {
    fn default() -> Self {
        Self::new(["Dr. ", "X", " is great"])
    }
}

#[async_trait::async_trait]
impl ChatClient for ScriptedChat {
    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        if self.fail_on_request {
            return Err(ProfError::LlmError("mock completion failure".to_string()));
        }

        let items: Vec<Result<String>> = self
            .script
            .iter()
            .cloned()
            .map(|step| step.map_err(ProfError::StreamError))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}
