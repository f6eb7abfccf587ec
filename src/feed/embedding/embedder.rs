//! Embedding model wrapper for Rig + Ollama.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client as ReqwestClient;
use rig::client::{EmbeddingsClient, Nothing};
use rig::embeddings::EmbeddingModel;
use rig::providers::ollama;
use tracing::debug;

use crate::feed::core::config::EmbeddingConfig;
use crate::feed::core::errors::{FeedError, FeedResult};
use crate::feed::core::vector::Vector;

/// Boxed future type for embedder operations.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstraction over sentence-embedding models.
///
/// Implementations must be deterministic for a fixed model version and must
/// return unit-normalized vectors of exactly [`Embedder::ndims`] dimensions.
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    ///
    /// # Errors
    /// Returns an error if the model call fails or its output is unusable.
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, FeedResult<Vector>>;
    /// Return embedding dimensionality.
    fn ndims(&self) -> usize;
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

type OllamaEmbeddingModel = ollama::EmbeddingModel<ReqwestClient>;

/// Ollama embedder using Rig provider.
#[derive(Clone)]
pub struct OllamaEmbedder {
    model: OllamaEmbeddingModel,
    model_name: String,
    ndims: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder from config.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> FeedResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(Nothing);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(FeedError::from)?;
        let model = client.embedding_model_with_ndims(config.model.clone(), config.ndims);
        Ok(Self {
            model,
            model_name: config.model.clone(),
            ndims: config.ndims,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, FeedResult<Vector>> {
        let text = text.to_string();
        Box::pin(async move {
            let embedding = self
                .model
                .embed_text(&text)
                .await
                .map_err(FeedError::Embedding)?;
            let vector = Vector::normalized_f64(&embedding.vec)?;
            vector.ensure_dims(self.ndims, "ollama embedding")?;
            debug!(model = %self.model_name, chars = text.len(), "embedded text");
            Ok(vector)
        })
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
