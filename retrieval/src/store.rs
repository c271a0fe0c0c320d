//! Vector storage.
//!
//! A [`VectorStore`] persists [`DocumentRecord`]s and answers k-nearest
//! queries by euclidean distance. Stores keep records in insertion order so
//! equal distances rank the older record first.

use async_trait::async_trait;
use docrag_embeddings::{EmbeddingError, nearest_by_distance};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{DocumentRecord, Neighbor};

/// Trait for vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store one record. Either the whole record becomes visible or nothing
    /// does.
    async fn insert(&self, record: DocumentRecord) -> StoreResult<()>;

    /// Delete every record whose content equals `content` byte for byte.
    /// Returns the number of records removed, which may be zero.
    async fn delete_by_content(&self, content: &str) -> StoreResult<usize>;

    /// Delete the record with the given identifier, if present.
    async fn delete_by_id(&self, id: &str) -> StoreResult<usize>;

    /// Return up to `k` records nearest to `query`, closest first.
    async fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>>;

    /// Number of stored records.
    async fn count(&self) -> StoreResult<usize>;
}

/// Dimension shared by the stored records, if any are stored.
pub(crate) fn stored_dimension(records: &[DocumentRecord]) -> Option<usize> {
    records.first().map(DocumentRecord::dimension)
}

/// Reject a vector whose length differs from the stored records.
pub(crate) fn check_dimension(records: &[DocumentRecord], actual: usize) -> StoreResult<()> {
    match stored_dimension(records) {
        Some(expected) if expected != actual => {
            Err(StoreError::DimensionMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Rank `records` by distance to `query`.
pub(crate) fn rank(records: &[DocumentRecord], query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
    if records.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    check_dimension(records, query.len())?;

    let ranked = nearest_by_distance(query, records.iter().map(|r| r.embedding.as_slice()), k)
        .map_err(|e| match e {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                StoreError::DimensionMismatch { expected, actual }
            }
            other => StoreError::Corrupt(other.to_string()),
        })?;

    Ok(ranked
        .into_iter()
        .map(|(position, distance)| {
            let record = &records[position];
            Neighbor {
                id: record.id.clone(),
                content: record.content.clone(),
                distance,
            }
        })
        .collect())
}

/// In-memory vector store, for tests and throwaway sessions.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record in insertion order.
    pub async fn snapshot(&self) -> Vec<DocumentRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert(&self, record: DocumentRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        check_dimension(&records, record.dimension())?;
        debug!("Inserted record {} into memory store", record.id);
        records.push(record);
        Ok(())
    }

    async fn delete_by_content(&self, content: &str) -> StoreResult<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.content != content);
        Ok(before - records.len())
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(before - records.len())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        let records = self.records.read().await;
        rank(&records, query, k)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().await.len())
    }
}
