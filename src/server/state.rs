//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::feed::core::config::FeedConfig;
use crate::feed::core::errors::FeedResult;
use crate::feed::engine::FeedEngine;

/// Shared application state.
pub struct AppState {
    /// Feed engine serving both endpoints.
    pub engine: FeedEngine,
}

impl AppState {
    /// Wrap an already constructed engine.
    #[must_use]
    pub fn new(engine: FeedEngine) -> Arc<Self> {
        Arc::new(Self { engine })
    }

    /// Build the engine from config and check the corpus dimension.
    ///
    /// # Errors
    /// Returns an error if the backends cannot be opened or the corpus
    /// disagrees with the embedder dimension.
    pub async fn from_config(config: FeedConfig) -> FeedResult<Arc<Self>> {
        let engine = FeedEngine::from_config(config).await?;
        engine.verify_dimensions().await?;
        Ok(Self::new(engine))
    }
}
