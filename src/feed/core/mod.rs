//! Core feed types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod interests;
pub mod paper;
pub mod vector;

pub use config::{
    EmbeddingConfig, FeedConfig, InterestLimits, RetrievalConfig, RetryPolicy, ScoringWeights,
    ServerConfig, StorageConfig, TimeoutConfig,
};
pub use errors::{ErrorKind, FeedError, FeedResult};
pub use ids::UserId;
pub use interests::InterestSet;
pub use paper::{FieldVectors, PaperRecord, PaperSummary, ScoredPaper};
pub use vector::Vector;
