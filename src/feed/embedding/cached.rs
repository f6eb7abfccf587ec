//! LRU cache in front of an embedder.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::trace;

use crate::feed::core::errors::FeedResult;
use crate::feed::core::vector::Vector;
use crate::feed::embedding::embedder::{EmbedFuture, Embedder};

/// Embedder wrapper that memoizes vectors by exact input text.
///
/// Safe because embedding is a pure function of the text for a fixed model.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<LruCache<String, Vector>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    /// Wrap `inner` with a cache holding up to `capacity` vectors.
    #[must_use]
    pub fn new(inner: E, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached vectors.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embed_text(&self, text: &str) -> EmbedFuture<'_, FeedResult<Vector>> {
        let text = text.to_string();
        Box::pin(async move {
            if let Some(hit) = self.cache.lock().await.get(&text) {
                trace!("embedding cache hit");
                return Ok(hit.clone());
            }
            let vector = self.inner.embed_text(&text).await?;
            self.cache.lock().await.put(text, vector.clone());
            Ok(vector)
        })
    }

    fn ndims(&self) -> usize {
        self.inner.ndims()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
