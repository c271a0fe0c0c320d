//! Retriever: the read path.

use std::sync::Arc;
use std::time::Duration;

use docrag_embeddings::{EmbeddingProvider, EmbeddingRequest, validate_embedding};
use tracing::debug;

use crate::deadline::{Operation, bounded};
use crate::error::{RagError, Result};
use crate::record::Neighbor;
use crate::store::VectorStore;

/// Finds the stored documents nearest to a query.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    timeout: Option<Duration>,
}

impl Retriever {
    /// Create a retriever over `store` using `embedder` for queries.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            timeout: None,
        }
    }

    /// Bound every external call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Up to `k` nearest documents with their distances, closest first.
    ///
    /// Fewer than `k` stored documents yields all of them; an empty store
    /// yields an empty list.
    pub async fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        if query.is_empty() {
            return Err(RagError::InvalidInput("query is empty".to_string()));
        }
        if k == 0 {
            return Err(RagError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }

        let response = bounded(
            Operation::Embed,
            self.timeout,
            self.embedder.embed(EmbeddingRequest::new(query)),
        )
        .await?;
        validate_embedding(&response.embedding, None)?;

        let neighbors = bounded(
            Operation::StoreQuery,
            self.timeout,
            self.store.nearest(&response.embedding, k),
        )
        .await?;

        debug!("Retrieved {} of {k} requested documents", neighbors.len());
        Ok(neighbors)
    }

    /// Up to `k` nearest document contents, closest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        Ok(self
            .nearest(query, k)
            .await?
            .into_iter()
            .map(|n| n.content)
            .collect())
    }
}
