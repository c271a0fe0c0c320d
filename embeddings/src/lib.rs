//! # Embeddings
//!
//! The embedding side of docrag: turning text into fixed-length vectors and
//! measuring the distance between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingProvider ──► EmbeddingResponse   │
//! │                            │                      │             │
//! │                            ▼                      ▼             │
//! │                   OpenAI-compatible API   validate_embedding    │
//! │                                                   │             │
//! │                                                   ▼             │
//! │                                       nearest_by_distance       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider, validate_embedding,
};
pub use similarity::{euclidean_distance, nearest_by_distance};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Model used when nothing else is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
