//! Configuration for docrag.
//!
//! Everything a deployment varies (endpoints, credentials, models, store
//! location, deadlines) lives in [`RagConfig`] and is handed to components
//! at construction time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docrag_embeddings::DEFAULT_EMBEDDING_MODEL;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{RagError, Result};
use crate::generation::DEFAULT_CHAT_MODEL;

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "DOCRAG_BASE_URL";

/// Environment variable overriding the store location.
pub const STORE_PATH_ENV: &str = "DOCRAG_STORE_PATH";

/// Default provider endpoint: a local OpenAI-compatible server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8012";

/// Default number of documents to retrieve.
pub const DEFAULT_K: usize = 3;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding and generative model provider.
    pub provider: ProviderConfig,

    /// Vector store location.
    pub store: StoreConfig,

    /// Query behavior.
    pub retrieval: QueryConfig,
}

/// Configuration for the model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,

    /// Bearer credential, if the server needs one.
    pub api_key: Option<String>,

    /// Model used for embeddings.
    pub embedding_model: String,

    /// Model used for answers.
    pub chat_model: String,

    /// Expected embedding dimension; unchecked when unset.
    pub dimension: Option<usize>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            dimension: None,
        }
    }
}

/// Configuration for the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON store file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: store_path_in(dirs::data_dir()),
        }
    }
}

/// Default store file under `data_dir`; empty when there is no data
/// directory, which [`RagConfig::validate`] rejects.
fn store_path_in(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir
        .map(|dir| dir.join("docrag/documents.json"))
        .unwrap_or_default()
}

/// Configuration for query processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of documents retrieved when the caller does not say.
    pub default_k: usize,

    /// Deadline for each external call, in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_K,
            timeout_secs: None,
        }
    }
}

impl RagConfig {
    /// Default configuration file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docrag/config.toml"))
    }

    /// Parse a TOML document.
    ///
    /// Values are checked by [`RagConfig::validate`] once environment
    /// overrides have been applied.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RagError::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present and built-in defaults otherwise.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_toml_str(&content)
                    .map_err(|e| RagError::Config(format!("{}: {e}", path.display())))
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(RagError::Config(format!("{}: {e}", path.display()))),
        }
    }

    /// Apply environment overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// The credential only fills an unset `api_key`; the base URL and
    /// store path replace configured values.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.api_key.is_none() {
            self.provider.api_key = lookup(API_KEY_ENV).filter(|key| !key.is_empty());
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            self.provider.base_url = url;
        }
        if let Some(path) = lookup(STORE_PATH_ENV).filter(|path| !path.is_empty()) {
            self.store.path = PathBuf::from(path);
        }
        self
    }

    /// Check values that would otherwise fail later at call time.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(RagError::Config(format!(
                "store.path is not set and no data directory is available; \
                 set it in the config file or {STORE_PATH_ENV}"
            )));
        }
        if self.provider.base_url.is_empty() {
            return Err(RagError::Config("provider.base_url is empty".to_string()));
        }
        if self.retrieval.default_k == 0 {
            return Err(RagError::Config(
                "retrieval.default_k must be at least 1".to_string(),
            ));
        }
        if self.retrieval.timeout_secs == Some(0) {
            return Err(RagError::Config(
                "retrieval.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.provider.dimension == Some(0) {
            return Err(RagError::Config(
                "provider.dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-call deadline, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.retrieval.timeout_secs.map(Duration::from_secs)
    }
}
