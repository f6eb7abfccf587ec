//! Configuration for the feed subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::feed::core::errors::{FeedError, FeedResult};

/// Tolerance for the weight-sum invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Top-level configuration for the feed engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Embedding model settings.
    pub embedding: EmbeddingConfig,
    /// Relevance weights.
    pub scoring: ScoringWeights,
    /// Result selection settings.
    pub retrieval: RetrievalConfig,
    /// Interest payload limits.
    pub interests: InterestLimits,
    /// Deadlines for blocking calls.
    pub timeouts: TimeoutConfig,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl FeedConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> FeedResult<()> {
        self.scoring.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(FeedError::InvalidConfig(
                "retrieval.top_k must be > 0".to_string(),
            ));
        }

        if self.retrieval.fallback_query.trim().is_empty() {
            return Err(FeedError::InvalidConfig(
                "retrieval.fallback_query must not be blank".to_string(),
            ));
        }

        if self.embedding.ndims == 0 {
            return Err(FeedError::InvalidConfig(
                "embedding.ndims must be > 0".to_string(),
            ));
        }

        if self.storage.read_pool_size == 0 {
            return Err(FeedError::InvalidConfig(
                "storage.read_pool_size must be > 0".to_string(),
            ));
        }

        if self.interests.max_interests == 0 || self.interests.max_interest_chars == 0 {
            return Err(FeedError::InvalidConfig(
                "interest limits must be > 0".to_string(),
            ));
        }

        if self.timeouts.embed_ms == 0 || self.timeouts.corpus_ms == 0 || self.timeouts.store_ms == 0
        {
            return Err(FeedError::InvalidConfig(
                "timeouts must be > 0".to_string(),
            ));
        }

        if self.retry.backoff_base_ms > self.retry.backoff_max_ms {
            return Err(FeedError::InvalidConfig(
                "retry.backoff_base_ms must not exceed retry.backoff_max_ms".to_string(),
            ));
        }

        if let Some(base_url) = &self.embedding.base_url {
            Url::parse(base_url)?;
        }

        Ok(())
    }

    /// Load configuration: defaults, then an optional JSON file named by
    /// `PAPERFEED_CONFIG`, then individual `PAPERFEED_*` overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or an override
    /// is not a valid value.
    pub fn from_env() -> FeedResult<Self> {
        let mut config = match std::env::var("PAPERFEED_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)?;
                serde_json::from_str(&raw)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(path) = std::env::var("PAPERFEED_DB_PATH") {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("PAPERFEED_OLLAMA_URL") {
            config.embedding.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("PAPERFEED_EMBED_MODEL") {
            config.embedding.model = model;
        }
        if let Some(ndims) = parse_env("PAPERFEED_EMBED_NDIMS")? {
            config.embedding.ndims = ndims;
        }
        if let Some(port) = parse_env("PAPERFEED_PORT")? {
            config.server.port = port;
        }
        if let Some(top_k) = parse_env("PAPERFEED_TOP_K")? {
            config.retrieval.top_k = top_k;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> FeedResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FeedError::InvalidConfig(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

/// Fixed-weight blend of the three field similarities.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the abstract similarity.
    #[serde(rename = "abstract")]
    pub abstract_weight: f64,
    /// Weight of the title similarity.
    #[serde(rename = "title")]
    pub title_weight: f64,
    /// Weight of the keywords similarity.
    #[serde(rename = "keywords")]
    pub keywords_weight: f64,
}

impl ScoringWeights {
    /// The relevance policy: abstract 0.5, title 0.3, keywords 0.2.
    pub const DEFAULT: Self = Self {
        abstract_weight: 0.5,
        title_weight: 0.3,
        keywords_weight: 0.2,
    };

    /// Sum of the three weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.abstract_weight + self.title_weight + self.keywords_weight
    }

    /// Check that every weight is finite and non-negative and that they sum to 1.
    ///
    /// # Errors
    /// Returns `FeedError::InvalidConfig` describing the violated invariant.
    pub fn validate(&self) -> FeedResult<()> {
        for (name, weight) in [
            ("abstract", self.abstract_weight),
            ("title", self.title_weight),
            ("keywords", self.keywords_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FeedError::InvalidConfig(format!(
                    "scoring.{name} must be a finite non-negative number, got {weight}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(FeedError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Result selection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of papers returned per request.
    pub top_k: usize,
    /// Query text used when a user has no stored interests.
    pub fallback_query: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: crate::feed::retrieval::top_k::DEFAULT_TOP_K,
            fallback_query: crate::feed::retrieval::resolver::FALLBACK_QUERY.to_string(),
        }
    }
}

/// Limits applied to update-interests payloads.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestLimits {
    /// Maximum number of interests per user.
    pub max_interests: usize,
    /// Maximum characters per interest.
    pub max_interest_chars: usize,
}

impl Default for InterestLimits {
    fn default() -> Self {
        Self {
            max_interests: 64,
            max_interest_chars: 512,
        }
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Number of read connections in the pool.
    pub read_pool_size: usize,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("paperfeed.sqlite"),
            read_pool_size: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Embedding model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name.
    pub model: String,
    /// Embedding vector dimensions.
    pub ndims: usize,
    /// Optional custom Ollama base URL.
    pub base_url: Option<String>,
    /// LRU capacity for query embeddings; 0 disables caching.
    pub cache_capacity: usize,
    /// Directory for locally downloaded model files.
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm".to_string(),
            ndims: 384,
            base_url: None,
            cache_capacity: 256,
            cache_dir: PathBuf::from(".paperfeed/models"),
        }
    }
}

/// Deadlines for the potentially long-running calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Embedding call deadline.
    pub embed_ms: u64,
    /// Corpus scoring query deadline.
    pub corpus_ms: u64,
    /// Interest lookup deadline. Interest writes are not deadline-bounded.
    pub store_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embed_ms: 30_000,
            corpus_ms: 10_000,
            store_ms: 5_000,
        }
    }
}

/// Bounded exponential backoff for transient failures.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Cap on a single delay in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 50,
            backoff_max_ms: 1_000,
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: crate::server::DEFAULT_PORT,
        }
    }
}
