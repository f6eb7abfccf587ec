//! Retrieval modules: interest resolution, relevance scoring, top-k selection.

pub mod resolver;
pub mod scoring;
pub mod top_k;

pub use resolver::{FALLBACK_QUERY, QuerySource, ResolvedQuery, resolve_query_text};
pub use scoring::{dot, relevance, score_all};
pub use top_k::{DEFAULT_TOP_K, select_top_k};
