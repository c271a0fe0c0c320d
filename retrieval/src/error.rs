//! Error types for the retrieval core.

use std::time::Duration;

use thiserror::Error;

use crate::deadline::Operation;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Result type alias for vector store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the document index, retriever and answerer.
///
/// Every operation either succeeds completely or returns exactly one of
/// these, with no partial change to the vector store.
#[derive(Error, Debug)]
pub enum RagError {
    /// Empty content or query, or a `k` of zero.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding provider was unreachable or returned malformed output.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(#[from] docrag_embeddings::EmbeddingError),

    /// The vector store was unreachable or rejected the operation.
    #[error("storage failed: {0}")]
    StorageFailure(#[from] StoreError),

    /// The generative model was unreachable or returned no completion.
    #[error("generation failed: {0}")]
    GenerationFailure(#[from] GenerationError),

    /// An external call did not finish before its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: Operation, after: Duration },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read the backing storage.
    #[error("failed to read store: {0}")]
    Read(String),

    /// Failed to write the backing storage.
    #[error("failed to write store: {0}")]
    Write(String),

    /// The backing storage exists but cannot be interpreted.
    #[error("corrupt store: {0}")]
    Corrupt(String),

    /// A vector does not match the dimension of the stored vectors.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Generative model errors.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The model answered without any completion.
    #[error("no completion returned")]
    NoCompletion,

    /// The first completion carried no message content.
    #[error("completion has no content")]
    MissingContent,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
