//! Test doubles for the external collaborators.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docrag_embeddings::{EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use docrag_retrieval::{
    ChatMessage, ChatModel, Completion, DocumentRecord, GenerationError, InMemoryStore, Neighbor,
    Rag, StoreError, StoreResult, VectorStore,
};

fn response(embedding: Vec<f32>, model: &str) -> EmbeddingResponse {
    EmbeddingResponse {
        dimension: embedding.len(),
        embedding,
        model: model.to_string(),
        tokens_used: None,
    }
}

/// Bag-of-keywords embedder: one dimension per vocabulary word.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Vocabulary covering the sky/grass scenario.
    pub fn colors() -> Self {
        Self::new(&["sky", "blue", "grass", "green", "color"])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if let Some(i) = self.vocabulary.iter().position(|w| *w == token) {
                vector[i] += 1.0;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    fn default_model(&self) -> &str {
        "keyword-v1"
    }

    async fn embed(&self, request: EmbeddingRequest) -> docrag_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(response(self.vector(&request.text), self.default_model()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Embedder with a fixed text → vector table; unknown text is an error.
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new<const D: usize>(entries: &[(&str, [f32; D])]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, vector)| ((*text).to_string(), vector.to_vec()))
                .collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    fn name(&self) -> &str {
        "table"
    }

    fn default_model(&self) -> &str {
        "table-v1"
    }

    async fn embed(&self, request: EmbeddingRequest) -> docrag_embeddings::Result<EmbeddingResponse> {
        let vector = self.table.get(&request.text).cloned().ok_or_else(|| {
            EmbeddingError::InvalidResponse(format!("no vector for {:?}", request.text))
        })?;
        Ok(response(vector, self.default_model()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Embedder that always fails as if the provider were unreachable.
#[derive(Default)]
pub struct FailingEmbedder {
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    fn default_model(&self) -> &str {
        "none"
    }

    async fn embed(&self, _request: EmbeddingRequest) -> docrag_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EmbeddingError::ApiRequest("connection refused".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Embedder that returns a vector the core must refuse to store.
pub struct MalformedEmbedder;

#[async_trait]
impl EmbeddingProvider for MalformedEmbedder {
    fn name(&self) -> &str {
        "malformed"
    }

    fn default_model(&self) -> &str {
        "broken"
    }

    async fn embed(&self, _request: EmbeddingRequest) -> docrag_embeddings::Result<EmbeddingResponse> {
        Ok(response(vec![1.0, f32::NAN], self.default_model()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Embedder that takes far longer than any test deadline.
pub struct SlowEmbedder {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    fn name(&self) -> &str {
        "slow"
    }

    fn default_model(&self) -> &str {
        "slow-v1"
    }

    async fn embed(&self, _request: EmbeddingRequest) -> docrag_embeddings::Result<EmbeddingResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(response(vec![1.0], self.default_model()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Store whose every operation fails.
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn insert(&self, _record: DocumentRecord) -> StoreResult<()> {
        Err(StoreError::Write("write rejected".to_string()))
    }

    async fn delete_by_content(&self, _content: &str) -> StoreResult<usize> {
        Err(StoreError::Write("write rejected".to_string()))
    }

    async fn delete_by_id(&self, _id: &str) -> StoreResult<usize> {
        Err(StoreError::Write("write rejected".to_string()))
    }

    async fn nearest(&self, _query: &[f32], _k: usize) -> StoreResult<Vec<Neighbor>> {
        Err(StoreError::Read("connection reset".to_string()))
    }

    async fn count(&self) -> StoreResult<usize> {
        Err(StoreError::Read("connection reset".to_string()))
    }
}

/// Store that commits each insert and then stalls before answering.
pub struct StallingStore {
    pub inner: Arc<InMemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl VectorStore for StallingStore {
    async fn insert(&self, record: DocumentRecord) -> StoreResult<()> {
        self.inner.insert(record).await?;
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn delete_by_content(&self, content: &str) -> StoreResult<usize> {
        self.inner.delete_by_content(content).await
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<usize> {
        self.inner.delete_by_id(id).await
    }

    async fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        self.inner.nearest(query, k).await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }
}

/// Chat model that records every request and replays a fixed reply.
pub struct RecordingChatModel {
    reply: Vec<Completion>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingChatModel {
    pub fn replying(text: &str) -> Self {
        Self::with_completions(vec![Completion::text(text)])
    }

    pub fn with_completions(reply: Vec<Completion>) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for RecordingChatModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<Vec<Completion>, GenerationError> {
        self.requests.lock().unwrap().push(messages);
        Ok(self.reply.clone())
    }
}

/// Chat model that always fails.
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
    ) -> Result<Vec<Completion>, GenerationError> {
        Err(GenerationError::ApiRequest("service unavailable".to_string()))
    }
}

/// Engine over the given collaborators.
pub fn rag_with(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
) -> Rag {
    Rag::builder()
        .with_embedder(embedder)
        .with_store(store)
        .with_chat_model(chat)
        .build()
        .unwrap()
}

/// Engine over a keyword embedder and a fresh in-memory store.
pub fn keyword_rag() -> (Rag, Arc<InMemoryStore>, Arc<RecordingChatModel>) {
    let store = Arc::new(InMemoryStore::new());
    let chat = Arc::new(RecordingChatModel::replying("The sky is blue."));
    let rag = rag_with(
        Arc::new(KeywordEmbedder::colors()),
        store.clone(),
        chat.clone(),
    );
    (rag, store, chat)
}
