//! Document index: the write path.

use std::sync::Arc;
use std::time::Duration;

use docrag_embeddings::{EmbeddingProvider, EmbeddingRequest, validate_embedding};
use tracing::{debug, info};

use crate::deadline::{Operation, bounded};
use crate::error::{RagError, Result};
use crate::record::{DocumentId, DocumentRecord, metric_version};
use crate::store::VectorStore;

/// Embeds documents and writes them to the vector store.
///
/// Identical content added twice produces two records. Removal by content
/// deletes every copy.
#[derive(Clone)]
pub struct DocumentIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    timeout: Option<Duration>,
}

impl DocumentIndex {
    /// Create an index over `store` using `embedder`.
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

    /// Embed `content` and store it. Returns the new record's id.
    ///
    /// The store is untouched unless the embedding succeeds, and a failed
    /// insert leaves no record behind. After a [`RagError::Timeout`] on the
    /// insert the record may or may not be stored, but never partially.
    pub async fn add(&self, content: &str) -> Result<DocumentId> {
        if content.is_empty() {
            return Err(RagError::InvalidInput(
                "document content is empty".to_string(),
            ));
        }

        let response = bounded(
            Operation::Embed,
            self.timeout,
            self.embedder.embed(EmbeddingRequest::new(content)),
        )
        .await?;
        validate_embedding(&response.embedding, None)?;

        debug!(
            "Embedded document ({} bytes) into {} dimensions",
            content.len(),
            response.dimension
        );

        let record = DocumentRecord::new(content, response.embedding, metric_version(&response.model));
        let id = record.id.clone();

        bounded(Operation::StoreInsert, self.timeout, self.store.insert(record)).await?;

        info!("Indexed document {id}");
        Ok(id)
    }

    /// Delete every record whose content equals `content` exactly.
    ///
    /// Removing absent content is not an error; it reports zero.
    pub async fn remove(&self, content: &str) -> Result<usize> {
        let removed = bounded(
            Operation::StoreDelete,
            self.timeout,
            self.store.delete_by_content(content),
        )
        .await?;

        info!("Removed {removed} documents by content");
        Ok(removed)
    }

    /// Delete the record with identifier `id`.
    pub async fn remove_by_id(&self, id: &str) -> Result<usize> {
        let removed = bounded(
            Operation::StoreDelete,
            self.timeout,
            self.store.delete_by_id(id),
        )
        .await?;

        info!("Removed {removed} documents with id {id}");
        Ok(removed)
    }
}
