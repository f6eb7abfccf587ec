//! Error types for the ranking pipeline.

use thiserror::Error;

/// How a failure should be reported to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; rejected before touching the store or the model.
    Validation,
    /// A store, corpus or model failure that aborts the request.
    Dependency,
    /// A connectivity hiccup that may succeed on retry.
    Transient,
}

impl ErrorKind {
    /// Stable lowercase label used in logs and HTTP error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Dependency => "dependency",
            Self::Transient => "transient",
        }
    }
}

/// Feed subsystem error type.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Malformed user identifier or interest payload.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Vector dimensionality disagrees between model and corpus.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Where the mismatch was detected.
        context: String,
        /// Dimension of the query vector or embedding model.
        expected: usize,
        /// Dimension that was actually found.
        found: usize,
    },
    /// Raw model output that cannot be normalized.
    #[error("invalid vector: {0}")]
    InvalidVector(String),
    /// A blocking call exceeded its deadline.
    #[error("{operation} timed out after {millis} ms")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// Deadline in milliseconds.
        millis: u64,
    },
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Embedding error from Rig.
    #[error("embedding error: {0}")]
    Embedding(#[from] rig::embeddings::EmbeddingError),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Local embedding model failure.
    #[error("local embedding error: {0}")]
    LocalEmbedding(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Classify this error for propagation and retry decisions.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Timeout { .. } => ErrorKind::Transient,
            Self::Sqlite(err) => sqlite_kind(err),
            Self::TokioSqlite(err) => match err {
                tokio_rusqlite::Error::ConnectionClosed => ErrorKind::Transient,
                tokio_rusqlite::Error::Rusqlite(inner) => sqlite_kind(inner),
                _ => ErrorKind::Dependency,
            },
            Self::HttpClient(_) => ErrorKind::Transient,
            _ => ErrorKind::Dependency,
        }
    }

    /// Whether a bounded retry may help.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

fn sqlite_kind(err: &rusqlite::Error) -> ErrorKind {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
            ErrorKind::Transient
        }
        _ => ErrorKind::Dependency,
    }
}

/// Convenience result alias for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
