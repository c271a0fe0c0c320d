//! Answer orchestration: retrieve, compose, generate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::deadline::{Operation, bounded};
use crate::error::{GenerationError, Result};
use crate::generation::{ChatMessage, ChatModel};
use crate::retriever::Retriever;

/// First system instruction of every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Second system instruction of every generation request.
pub const CONTEXT_INSTRUCTION: &str = "Use the provided context to answer the user's query.";

/// Compose the generation request for `query` grounded on `context`.
pub fn build_messages(context: &str, query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::system(CONTEXT_INSTRUCTION),
        ChatMessage::user(format!("Context: {context}\n\nQuestion: {query}")),
    ]
}

/// Answers questions with retrieved documents as context.
///
/// No retries, no context truncation and no token accounting happen here.
#[derive(Clone)]
pub struct Answerer {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    timeout: Option<Duration>,
}

impl Answerer {
    /// Create an answerer.
    pub fn new(retriever: Retriever, model: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            model,
            timeout: None,
        }
    }

    /// Bound the generation call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `query` using the `k` nearest documents as context.
    ///
    /// An empty store still produces a request, with empty context. The
    /// first completion's text is returned verbatim.
    pub async fn answer(&self, query: &str, k: usize) -> Result<String> {
        let docs = self.retriever.search(query, k).await?;
        let context = docs.join("\n");
        debug!(
            "Answering with {} context documents ({} bytes)",
            docs.len(),
            context.len()
        );

        let messages = build_messages(&context, query);
        let completions = bounded(
            Operation::Generate,
            self.timeout,
            self.model.complete(messages),
        )
        .await?;

        let first = completions
            .into_iter()
            .next()
            .ok_or(GenerationError::NoCompletion)?;
        let text = first.content.ok_or(GenerationError::MissingContent)?;

        info!("Generated answer via {}", self.model.name());
        Ok(text)
    }
}
