//! # Retrieval
//!
//! Retrieval-augmented generation over a small document collection:
//!
//! - **Document Index**: embeds documents and stores them with their vectors
//! - **Retriever**: embeds a query and returns the nearest documents
//! - **Answerer**: feeds retrieved documents to a chat model as context
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Rag                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Document   │  │  Retriever   │◄─│   Answerer   │           │
//! │  │    Index     │  │              │  │              │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │      │      │          │      │              │                  │
//! │      ▼      └────┐┌────┘      ▼              ▼                  │
//! │  ┌────────────┐  ▼▼  ┌──────────────┐  ┌──────────────┐         │
//! │  │ Embedding  │      │ VectorStore  │  │  ChatModel   │         │
//! │  │ Provider   │      │              │  │              │         │
//! │  └────────────┘      └──────────────┘  └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_retrieval::{Rag, RagConfig};
//!
//! let config = RagConfig::load(None).await?.with_env_overrides();
//! let rag = Rag::from_config(&config)?;
//!
//! rag.add("The sky is blue.").await?;
//! let docs = rag.search("color of sky", 1).await?;
//! let answer = rag.answer("What color is the sky?", 1).await?;
//! ```

pub mod answer;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod file_store;
pub mod generation;
pub mod index;
pub mod record;
pub mod retriever;
pub mod store;

pub use answer::{Answerer, build_messages};
pub use config::RagConfig;
pub use deadline::Operation;
pub use engine::{Rag, RagBuilder};
pub use error::{GenerationError, RagError, Result, StoreError, StoreResult};
pub use file_store::JsonFileStore;
pub use generation::{ChatMessage, ChatModel, ChatRole, Completion, OpenAIChatModel};
pub use index::DocumentIndex;
pub use record::{DocumentId, DocumentRecord, Neighbor};
pub use retriever::Retriever;
pub use store::{InMemoryStore, VectorStore};

// Re-export from dependencies for convenience
pub use docrag_embeddings::{EmbeddingError, EmbeddingProvider, OpenAIProvider};
