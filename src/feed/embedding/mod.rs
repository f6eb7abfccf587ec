//! Embedding model modules.

pub mod cached;
pub mod embedder;
#[cfg(feature = "fastembed")]
pub mod local;

use std::num::NonZeroUsize;
use std::sync::Arc;

pub use cached::CachedEmbedder;
pub use embedder::{EmbedFuture, Embedder, OllamaEmbedder};
#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;

use crate::feed::core::config::EmbeddingConfig;
use crate::feed::core::errors::FeedResult;

/// Build the configured embedder, wrapped in an LRU cache when enabled.
///
/// With the `fastembed` feature the local model is used; otherwise Ollama.
///
/// # Errors
/// Returns an error if the underlying model cannot be initialized.
pub fn from_config(config: &EmbeddingConfig) -> FeedResult<Arc<dyn Embedder>> {
    #[cfg(feature = "fastembed")]
    let base = FastEmbedder::new(config)?;
    #[cfg(not(feature = "fastembed"))]
    let base = OllamaEmbedder::new(config)?;

    Ok(match NonZeroUsize::new(config.cache_capacity) {
        Some(capacity) => Arc::new(CachedEmbedder::new(base, capacity)),
        None => Arc::new(base),
    })
}
