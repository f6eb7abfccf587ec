//! Paper feed subsystem.
//!
//! Ranks a corpus of scholarly papers against a user's stored research
//! interests. Organized into:
//! - `core`: Configuration, errors, identifiers, interests, papers, and vectors
//! - `embedding`: Embedding model abstraction with Ollama, local, and cached implementations
//! - `storage`: `SQLite` connection pool, interest store, and paper corpus
//! - `retrieval`: Query resolution, relevance scoring, and top-k selection
//! - `engine`: Orchestration of the update and ranking operations

pub mod core;
pub mod embedding;
pub mod engine;
pub mod retrieval;
pub mod storage;

pub use core::{
    EmbeddingConfig, ErrorKind, FeedConfig, FeedError, FeedResult, FieldVectors, InterestLimits,
    InterestSet, PaperRecord, PaperSummary, RetrievalConfig, RetryPolicy, ScoredPaper,
    ScoringWeights, ServerConfig, StorageConfig, TimeoutConfig, UserId, Vector,
};
pub use embedding::{CachedEmbedder, EmbedFuture, Embedder, OllamaEmbedder};
pub use engine::{FeedBackends, FeedEngine, InterestUpdate, RankedFeed};
pub use retrieval::{FALLBACK_QUERY, QuerySource, ResolvedQuery};
pub use storage::{
    ConnectionPool, InterestStore, PaperCorpus, SqliteInterestStore, SqlitePaperCorpus,
};
