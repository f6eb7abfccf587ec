//! Persistent storage for interests and the paper corpus.

pub mod codec;
pub mod interest_store;
pub mod paper_corpus;
pub mod pool;
pub mod sql_functions;

pub use codec::{decode_vector, encode_vector};
pub use interest_store::{InterestStore, SqliteInterestStore, StoreFuture};
pub use paper_corpus::{PaperCorpus, SqlitePaperCorpus};
pub use pool::ConnectionPool;
pub use sql_functions::{RELEVANCE_FN, register_relevance_function};
