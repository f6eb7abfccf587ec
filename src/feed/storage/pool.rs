//! Pool of serialized `SQLite` sessions.
//!
//! Each `tokio_rusqlite::Connection` owns one background thread that runs
//! closures one at a time, so a session is never used concurrently. Reads
//! rotate across several such sessions; writes go through one writer.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_rusqlite::Connection;
use tracing::debug;

use crate::feed::core::config::StorageConfig;
use crate::feed::core::errors::FeedResult;
use crate::feed::storage::sql_functions::register_relevance_function;

struct PoolInner {
    writer: Connection,
    readers: Vec<Connection>,
    next: AtomicUsize,
}

/// Shared handle to the writer and read sessions.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open a file-backed pool with WAL journaling.
    ///
    /// # Errors
    /// Returns an error if any connection cannot be opened or configured.
    pub async fn open(config: &StorageConfig) -> FeedResult<Self> {
        let writer = open_configured(&config.sqlite_path, config.busy_timeout_ms).await?;
        let mut readers = Vec::with_capacity(config.read_pool_size);
        for _ in 0..config.read_pool_size.max(1) {
            readers.push(open_configured(&config.sqlite_path, config.busy_timeout_ms).await?);
        }
        debug!(
            path = %config.sqlite_path.display(),
            readers = readers.len(),
            "opened sqlite pool"
        );
        Ok(Self::from_parts(writer, readers))
    }

    /// Single in-memory session shared by readers and the writer.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened or configured.
    pub async fn in_memory() -> FeedResult<Self> {
        let conn = Connection::open_in_memory().await?;
        configure(&conn, 5_000, false).await?;
        Ok(Self::from_parts(conn.clone(), vec![conn]))
    }

    fn from_parts(writer: Connection, readers: Vec<Connection>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                writer,
                readers,
                next: AtomicUsize::new(0),
            }),
        }
    }

    /// Session used for transactional writes.
    #[must_use]
    pub fn writer(&self) -> &Connection {
        &self.inner.writer
    }

    /// Next read session, round-robin.
    #[must_use]
    pub fn reader(&self) -> &Connection {
        let readers = &self.inner.readers;
        let idx = self.inner.next.fetch_add(1, Ordering::Relaxed) % readers.len();
        &readers[idx]
    }

    /// Number of read sessions.
    #[must_use]
    pub fn read_sessions(&self) -> usize {
        self.inner.readers.len()
    }
}

async fn open_configured(path: &Path, busy_timeout_ms: u64) -> FeedResult<Connection> {
    let conn = Connection::open(path).await?;
    configure(&conn, busy_timeout_ms, true).await?;
    Ok(conn)
}

async fn configure(conn: &Connection, busy_timeout_ms: u64, wal: bool) -> FeedResult<()> {
    conn.call(move |conn| {
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        if wal {
            let _mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get(0)
            })?;
        }
        register_relevance_function(conn)?;
        Ok(())
    })
    .await?;
    Ok(())
}
