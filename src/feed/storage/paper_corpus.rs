//! Vector-scored paper corpus.

use rusqlite::OptionalExtension;
use tracing::debug;

use crate::feed::core::config::ScoringWeights;
use crate::feed::core::errors::{FeedError, FeedResult};
use crate::feed::core::paper::{PaperRecord, PaperSummary, ScoredPaper};
use crate::feed::core::vector::Vector;
use crate::feed::storage::codec::{BYTES_PER_DIM, encode_vector};
use crate::feed::storage::interest_store::StoreFuture;
use crate::feed::storage::pool::ConnectionPool;
use crate::feed::storage::sql_functions::RELEVANCE_FN;

/// Corpus of papers with precomputed field vectors.
pub trait PaperCorpus: Send + Sync {
    /// Score every paper against `query` and return the `k` most relevant,
    /// descending by relevance.
    ///
    /// # Errors
    /// Returns `FeedError::DimensionMismatch` if any stored vector disagrees
    /// with the query's dimension, or a storage error.
    fn top_k<'a>(
        &'a self,
        k: usize,
        query: &Vector,
        weights: &ScoringWeights,
    ) -> StoreFuture<'a, FeedResult<Vec<ScoredPaper>>>;

    /// Dimension of the stored vectors, `None` for an empty corpus.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn dimension(&self) -> StoreFuture<'_, FeedResult<Option<usize>>>;

    /// Insert a paper and return its row id.
    ///
    /// # Errors
    /// Returns an error if the vectors disagree with each other or with the
    /// corpus, or storage access fails.
    fn insert(&self, record: PaperRecord) -> StoreFuture<'_, FeedResult<i64>>;

    /// Number of papers.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn count(&self) -> StoreFuture<'_, FeedResult<usize>>;
}

const TABLE: &str = "papers";

struct RawRow {
    title: String,
    topics: String,
    abstract_text: String,
    doi: Option<String>,
    pub_date: Option<String>,
    authorships: String,
    relevance: f64,
}

enum Scan {
    Rows(Vec<RawRow>),
    Mismatched { rows: usize, found: usize },
}

/// `SQLite` implementation of the corpus.
///
/// Scoring runs inside `SQLite` via [`RELEVANCE_FN`].
pub struct SqlitePaperCorpus {
    pool: ConnectionPool,
}

impl SqlitePaperCorpus {
    /// Initialize the papers table.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn new(pool: ConnectionPool) -> FeedResult<Self> {
        pool.writer()
            .call(|conn| {
                conn.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {TABLE} (
                        id INTEGER PRIMARY KEY,
                        title TEXT NOT NULL,
                        topics TEXT NOT NULL DEFAULT '',
                        abstract TEXT NOT NULL DEFAULT '',
                        doi TEXT,
                        pub_date TEXT,
                        authorships TEXT NOT NULL DEFAULT '[]',
                        title_vector BLOB NOT NULL,
                        abstract_vector BLOB NOT NULL,
                        keywords_vector BLOB NOT NULL
                    )"
                ))?;
                Ok(())
            })
            .await?;

        Ok(Self { pool })
    }
}

impl PaperCorpus for SqlitePaperCorpus {
    fn top_k<'a>(
        &'a self,
        k: usize,
        query: &Vector,
        weights: &ScoringWeights,
    ) -> StoreFuture<'a, FeedResult<Vec<ScoredPaper>>> {
        let dims = query.len();
        let query_blob = encode_vector(query.as_slice());
        let weights = *weights;
        Box::pin(async move {
            let expected_bytes = i64::try_from(dims * BYTES_PER_DIM).unwrap_or(i64::MAX);
            let limit = i64::try_from(k).unwrap_or(i64::MAX);

            let scan = self
                .pool
                .reader()
                .call(move |conn| {
                    let mismatched: Option<(i64, i64)> = conn
                        .query_row(
                            &format!(
                                "SELECT COUNT(*), MIN(CASE
                                    WHEN length(abstract_vector) != ?1 THEN length(abstract_vector)
                                    WHEN length(title_vector) != ?1 THEN length(title_vector)
                                    ELSE length(keywords_vector) END)
                                 FROM {TABLE}
                                 WHERE length(abstract_vector) != ?1
                                    OR length(title_vector) != ?1
                                    OR length(keywords_vector) != ?1"
                            ),
                            rusqlite::params![expected_bytes],
                            |row| Ok((row.get(0)?, row.get::<_, Option<i64>>(1)?.unwrap_or(0))),
                        )
                        .map(|(count, found)| (count > 0).then_some((count, found)))?;
                    if let Some((rows, found_bytes)) = mismatched {
                        return Ok(Scan::Mismatched {
                            rows: usize::try_from(rows).unwrap_or(usize::MAX),
                            found: usize::try_from(found_bytes).unwrap_or(0) / BYTES_PER_DIM,
                        });
                    }

                    let mut stmt = conn.prepare(&format!(
                        "SELECT title, topics, abstract, doi, pub_date, authorships,
                                {RELEVANCE_FN}(abstract_vector, title_vector, keywords_vector,
                                               ?1, ?2, ?3, ?4) AS relevance
                         FROM {TABLE}
                         ORDER BY relevance DESC, id ASC
                         LIMIT ?5"
                    ))?;
                    let rows = stmt
                        .query_map(
                            rusqlite::params![
                                query_blob,
                                weights.abstract_weight,
                                weights.title_weight,
                                weights.keywords_weight,
                                limit
                            ],
                            |row| {
                                Ok(RawRow {
                                    title: row.get(0)?,
                                    topics: row.get(1)?,
                                    abstract_text: row.get(2)?,
                                    doi: row.get(3)?,
                                    pub_date: row.get(4)?,
                                    authorships: row.get(5)?,
                                    relevance: row.get(6)?,
                                })
                            },
                        )?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(Scan::Rows(rows))
                })
                .await?;

            let rows = match scan {
                Scan::Rows(rows) => rows,
                Scan::Mismatched { rows, found } => {
                    return Err(FeedError::DimensionMismatch {
                        context: format!("corpus ({rows} papers with skewed vectors)"),
                        expected: dims,
                        found,
                    });
                }
            };

            let mut scored = Vec::with_capacity(rows.len());
            for row in rows {
                scored.push(ScoredPaper {
                    relevance: row.relevance,
                    paper: PaperSummary {
                        title: row.title,
                        topics: row.topics,
                        abstract_text: row.abstract_text,
                        doi: row.doi,
                        pub_date: row.pub_date,
                        authorships: serde_json::from_str(&row.authorships)?,
                    },
                });
            }
            debug!(returned = scored.len(), k, "scored corpus");
            Ok(scored)
        })
    }

    fn dimension(&self) -> StoreFuture<'_, FeedResult<Option<usize>>> {
        Box::pin(async move {
            let bytes = self
                .pool
                .reader()
                .call(|conn| {
                    let bytes: Option<i64> = conn
                        .query_row(
                            &format!(
                                "SELECT length(abstract_vector) FROM {TABLE} ORDER BY id LIMIT 1"
                            ),
                            [],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(bytes)
                })
                .await?;
            Ok(bytes.map(|b| usize::try_from(b).unwrap_or(0) / BYTES_PER_DIM))
        })
    }

    fn insert(&self, record: PaperRecord) -> StoreFuture<'_, FeedResult<i64>> {
        Box::pin(async move {
            let dims = record.vectors.dimension()?;
            if let Some(existing) = self.dimension().await? {
                if existing != dims {
                    return Err(FeedError::DimensionMismatch {
                        context: "paper insert".to_string(),
                        expected: existing,
                        found: dims,
                    });
                }
            }

            let summary = record.summary;
            let authorships = serde_json::to_string(&summary.authorships)?;
            let title_blob = encode_vector(&record.vectors.title);
            let abstract_blob = encode_vector(&record.vectors.abstract_vector);
            let keywords_blob = encode_vector(&record.vectors.keywords);

            let id = self
                .pool
                .writer()
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {TABLE} (title, topics, abstract, doi, pub_date, authorships,
                                                  title_vector, abstract_vector, keywords_vector)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                        ),
                        rusqlite::params![
                            summary.title,
                            summary.topics,
                            summary.abstract_text,
                            summary.doi,
                            summary.pub_date,
                            authorships,
                            title_blob,
                            abstract_blob,
                            keywords_blob
                        ],
                    )?;
                    Ok(conn.last_insert_rowid())
                })
                .await?;
            Ok(id)
        })
    }

    fn count(&self) -> StoreFuture<'_, FeedResult<usize>> {
        Box::pin(async move {
            let count: i64 = self
                .pool
                .reader()
                .call(|conn| {
                    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| {
                        row.get(0)
                    })?)
                })
                .await?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}
