//! Interest storage: one ordered interest set per user.

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tracing::debug;

use crate::feed::core::errors::FeedResult;
use crate::feed::core::ids::UserId;
use crate::feed::core::interests::InterestSet;
use crate::feed::storage::pool::ConnectionPool;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Interest store trait.
pub trait InterestStore: Send + Sync {
    /// Atomically replace the user's interest set.
    ///
    /// Either the whole new set becomes visible or the prior set is kept.
    /// An empty set removes the user's interests.
    ///
    /// # Errors
    /// Returns an error if storage access fails; nothing is changed then.
    fn replace<'a>(
        &'a self,
        user_id: &UserId,
        interests: &InterestSet,
    ) -> StoreFuture<'a, FeedResult<()>>;

    /// Get the user's interest set, `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get<'a>(&'a self, user_id: &UserId) -> StoreFuture<'a, FeedResult<Option<InterestSet>>>;
}

const TABLE: &str = "user_interests";

/// `SQLite` implementation of the interest store.
pub struct SqliteInterestStore {
    pool: ConnectionPool,
}

impl SqliteInterestStore {
    /// Initialize the interest table.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn new(pool: ConnectionPool) -> FeedResult<Self> {
        pool.writer()
            .call(|conn| {
                conn.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {TABLE} (
                        user_id TEXT NOT NULL,
                        position INTEGER NOT NULL,
                        interest TEXT NOT NULL CHECK (length(trim(interest)) > 0),
                        created_at INTEGER NOT NULL,
                        PRIMARY KEY (user_id, position)
                    )"
                ))?;
                Ok(())
            })
            .await?;

        Ok(Self { pool })
    }
}

impl InterestStore for SqliteInterestStore {
    fn replace<'a>(
        &'a self,
        user_id: &UserId,
        interests: &InterestSet,
    ) -> StoreFuture<'a, FeedResult<()>> {
        let user_id = user_id.as_str().to_string();
        let interests = interests.as_slice().to_vec();
        Box::pin(async move {
            let count = interests.len();
            let created_at = Utc::now().timestamp_millis();
            let user = user_id.clone();

            // The closure runs to completion on the session thread even if
            // this future is dropped, so the transaction is never left open.
            self.pool
                .writer()
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        &format!("DELETE FROM {TABLE} WHERE user_id = ?1"),
                        rusqlite::params![user],
                    )?;
                    {
                        let mut stmt = tx.prepare(&format!(
                            "INSERT INTO {TABLE} (user_id, position, interest, created_at)
                             VALUES (?1, ?2, ?3, ?4)"
                        ))?;
                        for (position, interest) in interests.iter().enumerate() {
                            let position = i64::try_from(position).unwrap_or(i64::MAX);
                            stmt.execute(rusqlite::params![user, position, interest, created_at])?;
                        }
                    }
                    tx.commit()?;
                    Ok(())
                })
                .await?;

            debug!(user_id = %user_id, count, "replaced interests");
            Ok(())
        })
    }

    fn get<'a>(&'a self, user_id: &UserId) -> StoreFuture<'a, FeedResult<Option<InterestSet>>> {
        let user_id = user_id.as_str().to_string();
        Box::pin(async move {
            let rows = self
                .pool
                .reader()
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT interest FROM {TABLE} WHERE user_id = ?1 ORDER BY position ASC"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![user_id], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            if rows.is_empty() {
                Ok(None)
            } else {
                Ok(Some(InterestSet::from_stored(rows)))
            }
        })
    }
}
