//! The `Rag` engine: one handle over indexing, retrieval and answering.

use std::sync::Arc;
use std::time::Duration;

use docrag_embeddings::{EmbeddingProvider, OpenAIProvider};
use tracing::info;

use crate::answer::Answerer;
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::file_store::JsonFileStore;
use crate::generation::{ChatModel, OpenAIChatModel};
use crate::index::DocumentIndex;
use crate::record::{DocumentId, Neighbor};
use crate::retriever::Retriever;
use crate::store::VectorStore;

/// Wires the document index, retriever and answerer over shared
/// collaborators.
///
/// The engine keeps no mutable state of its own between calls.
pub struct Rag {
    index: DocumentIndex,
    retriever: Retriever,
    answerer: Answerer,
    default_k: usize,
}

impl Rag {
    /// Create a new engine builder.
    pub fn builder() -> RagBuilder {
        RagBuilder::new()
    }

    /// Build an engine talking to the configured provider and store file.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;

        let provider = &config.provider;
        let mut embedder =
            OpenAIProvider::new(&provider.base_url).with_model(&provider.embedding_model);
        let mut chat = OpenAIChatModel::new(&provider.base_url).with_model(&provider.chat_model);
        if let Some(key) = &provider.api_key {
            embedder = embedder.with_api_key(key);
            chat = chat.with_api_key(key);
        }
        if let Some(dimension) = provider.dimension {
            embedder = embedder.with_dimension(dimension);
        }

        info!(
            "Using provider {} and store {}",
            provider.base_url,
            config.store.path.display()
        );

        Self::builder()
            .with_embedder(Arc::new(embedder))
            .with_store(Arc::new(JsonFileStore::new(&config.store.path)))
            .with_chat_model(Arc::new(chat))
            .with_timeout(config.timeout())
            .with_default_k(config.retrieval.default_k)
            .build()
    }

    /// The write path.
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// The read path.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The answer path.
    pub fn answerer(&self) -> &Answerer {
        &self.answerer
    }

    /// Number of documents retrieved when the caller does not say.
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Index a document.
    pub async fn add(&self, content: &str) -> Result<DocumentId> {
        self.index.add(content).await
    }

    /// Remove every document with exactly this content.
    pub async fn remove(&self, content: &str) -> Result<usize> {
        self.index.remove(content).await
    }

    /// Remove a document by identifier.
    pub async fn remove_by_id(&self, id: &str) -> Result<usize> {
        self.index.remove_by_id(id).await
    }

    /// Contents of the `k` nearest documents.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        self.retriever.search(query, k).await
    }

    /// The `k` nearest documents with distances.
    pub async fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        self.retriever.nearest(query, k).await
    }

    /// Answer a question grounded on the `k` nearest documents.
    pub async fn answer(&self, query: &str, k: usize) -> Result<String> {
        self.answerer.answer(query, k).await
    }
}

/// Builder for the `Rag` engine.
pub struct RagBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    timeout: Option<Duration>,
    default_k: usize,
}

impl RagBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            embedder: None,
            store: None,
            chat_model: None,
            timeout: None,
            default_k: crate::config::DEFAULT_K,
        }
    }

    /// Set the embedding provider.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store.
    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the generative model.
    pub fn with_chat_model(mut self, chat_model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(chat_model);
        self
    }

    /// Bound every external call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default number of retrieved documents.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<Rag> {
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedding provider not set".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::Config("vector store not set".to_string()))?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::Config("chat model not set".to_string()))?;
        if self.default_k == 0 {
            return Err(RagError::Config(
                "default k must be at least 1".to_string(),
            ));
        }

        let index =
            DocumentIndex::new(Arc::clone(&embedder), Arc::clone(&store)).with_timeout(self.timeout);
        let retriever = Retriever::new(embedder, store).with_timeout(self.timeout);
        let answerer = Answerer::new(retriever.clone(), chat_model).with_timeout(self.timeout);

        Ok(Rag {
            index,
            retriever,
            answerer,
            default_k: self.default_k,
        })
    }
}

impl Default for RagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
