//! Stored document records and search hits.

use chrono::{DateTime, Utc};
use docrag_embeddings::Embedding;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated identifier of a stored document.
pub type DocumentId = String;

/// Tag for the distance metric the store ranks by.
pub const DISTANCE_METRIC: &str = "l2";

/// Build the metric tag recorded next to each embedding.
pub fn metric_version(model: &str) -> String {
    format!("{model}/{DISTANCE_METRIC}")
}

/// A stored (content, embedding) pair.
///
/// Records are immutable once stored. The embedding is always the
/// provider's output for `content` at insertion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique identifier assigned at insertion.
    pub id: DocumentId,

    /// The document text.
    pub content: String,

    /// Embedding of `content`.
    pub embedding: Embedding,

    /// Which model and metric produced `embedding`.
    pub metric_version: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record with a fresh identifier.
    pub fn new(
        content: impl Into<String>,
        embedding: Embedding,
        metric_version: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            embedding,
            metric_version: metric_version.into(),
            created_at: Utc::now(),
        }
    }

    /// Number of components in the embedding.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// One nearest-neighbor hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Identifier of the matched record.
    pub id: DocumentId,

    /// Content of the matched record.
    pub content: String,

    /// Distance to the query vector (lower is closer).
    pub distance: f32,
}
