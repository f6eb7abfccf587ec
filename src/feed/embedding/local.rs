//! Local all-MiniLM-L6-v2 embedder backed by fastembed.
//!
//! The model runs on the blocking thread pool since inference is CPU-bound.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::feed::core::config::EmbeddingConfig;
use crate::feed::core::errors::{FeedError, FeedResult};
use crate::feed::core::vector::Vector;
use crate::feed::embedding::embedder::{EmbedFuture, Embedder};

/// Output dimension of all-MiniLM-L6-v2.
pub const MINILM_DIMS: usize = 384;

/// Embedder running a local ONNX sentence-transformer.
pub struct FastEmbedder {
    // fastembed's `embed` needs `&mut self`.
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
}

impl FastEmbedder {
    /// Load (downloading on first use) the all-MiniLM-L6-v2 model.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created, the model
    /// fails to load, or `config.ndims` disagrees with the model.
    pub fn new(config: &EmbeddingConfig) -> FeedResult<Self> {
        if config.ndims != MINILM_DIMS {
            return Err(FeedError::DimensionMismatch {
                context: "embedding.ndims for all-MiniLM-L6-v2".to_string(),
                expected: MINILM_DIMS,
                found: config.ndims,
            });
        }
        std::fs::create_dir_all(&config.cache_dir)?;
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(false);
        let model =
            TextEmbedding::try_new(options).map_err(|e| FeedError::LocalEmbedding(e.to_string()))?;
        info!(cache_dir = %config.cache_dir.display(), "loaded local all-MiniLM-L6-v2");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: "all-MiniLM-L6-v2".to_string(),
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, FeedResult<Vector>> {
        let text = text.to_string();
        let model = Arc::clone(&self.model);
        Box::pin(async move {
            let raw = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, String> {
                let mut model = model
                    .lock()
                    .map_err(|e| format!("model lock poisoned: {e}"))?;
                let mut batch = model.embed(vec![text], None).map_err(|e| e.to_string())?;
                batch.pop().ok_or_else(|| "no embedding returned".to_string())
            })
            .await
            .map_err(|e| FeedError::LocalEmbedding(format!("embedding task failed: {e}")))?
            .map_err(FeedError::LocalEmbedding)?;

            let vector = Vector::normalized(raw)?;
            vector.ensure_dims(MINILM_DIMS, "local embedding")?;
            Ok(vector)
        })
    }

    fn ndims(&self) -> usize {
        MINILM_DIMS
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
