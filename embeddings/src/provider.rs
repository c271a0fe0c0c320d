//! Embedding providers.
//!
//! A provider maps one text to one vector. The OpenAI-compatible provider
//! talks to any server exposing the `/embeddings` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Request for generating an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Generate an embedding for the given text.
    ///
    /// Implementations must return a vector that passes
    /// [`validate_embedding`].
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is usable with its current configuration.
    fn is_available(&self) -> bool;
}

/// Reject vectors that cannot take part in distance ordering.
///
/// An empty vector or a non-finite component is malformed output. When
/// `expected_dimension` is set, the length must match it exactly.
pub fn validate_embedding(embedding: &[f32], expected_dimension: Option<usize>) -> Result<()> {
    if embedding.is_empty() {
        return Err(EmbeddingError::InvalidResponse(
            "embedding is empty".to_string(),
        ));
    }

    if let Some(position) = embedding.iter().position(|x| !x.is_finite()) {
        return Err(EmbeddingError::InvalidResponse(format!(
            "non-finite value at position {position}"
        )));
    }

    match expected_dimension {
        Some(expected) if expected != embedding.len() => Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        }),
        _ => Ok(()),
    }
}

/// OpenAI-compatible embedding provider.
pub struct OpenAIProvider {
    /// API key, sent as a bearer token when present.
    api_key: Option<String>,

    /// API base URL, without the trailing `/embeddings`.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Dimension every returned vector must have.
    expected_dimension: Option<usize>,
}

impl OpenAIProvider {
    /// Create a provider for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            default_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            expected_dimension: None,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Require every embedding to have exactly `dimension` components.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        debug!("Generating embedding with model: {model}");

        let body = serde_json::json!({
            "input": request.text,
            "model": model,
            "encoding_format": "float"
        });

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let bytes = response.bytes().await?;
        let result: OpenAIEmbeddingResponse = serde_json::from_slice(&bytes)?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))?
            .embedding;

        validate_embedding(&embedding, self.expected_dimension)?;

        let dimension = embedding.len();
        let tokens_used = result.usage.map(|u| u.total_tokens);

        info!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model: result.model.unwrap_or(model),
            dimension,
            tokens_used,
        })
    }

    fn is_available(&self) -> bool {
        !self.base_url.is_empty()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: Option<String>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}
