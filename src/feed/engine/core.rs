//! Feed engine orchestration.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::feed::core::config::FeedConfig;
use crate::feed::core::errors::{FeedError, FeedResult};
use crate::feed::core::ids::UserId;
use crate::feed::core::interests::InterestSet;
use crate::feed::core::paper::{PaperSummary, ScoredPaper};
use crate::feed::embedding::{self, Embedder};
use crate::feed::engine::retry::{retry_transient, with_timeout};
use crate::feed::retrieval::resolver::{ResolvedQuery, resolve_query_text};
use crate::feed::retrieval::top_k::select_top_k;
use crate::feed::storage::interest_store::{InterestStore, SqliteInterestStore};
use crate::feed::storage::paper_corpus::{PaperCorpus, SqlitePaperCorpus};
use crate::feed::storage::pool::ConnectionPool;

/// Backend dependencies for the feed engine.
pub struct FeedBackends {
    /// Interest store implementation.
    pub interest_store: Arc<dyn InterestStore>,
    /// Paper corpus implementation.
    pub corpus: Arc<dyn PaperCorpus>,
    /// Embedding model wrapper.
    pub embedder: Arc<dyn Embedder>,
}

impl FeedBackends {
    /// Build default `SQLite` backends from config.
    ///
    /// # Errors
    /// Returns an error if any backend cannot be initialized.
    pub async fn sqlite(config: &FeedConfig) -> FeedResult<Self> {
        let pool = ConnectionPool::open(&config.storage).await?;
        let interest_store = Arc::new(SqliteInterestStore::new(pool.clone()).await?);
        let corpus = Arc::new(SqlitePaperCorpus::new(pool).await?);
        let embedder = embedding::from_config(&config.embedding)?;

        Ok(Self {
            interest_store,
            corpus,
            embedder,
        })
    }
}

/// Acknowledgement of an interest update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterestUpdate {
    /// User whose interests were replaced.
    pub user_id: UserId,
    /// Number of interests now stored.
    pub stored: usize,
}

/// Ranked papers together with the query that produced them.
#[derive(Clone, Debug)]
pub struct RankedFeed {
    /// Resolved query text and its origin.
    pub query: ResolvedQuery,
    /// Papers, descending by relevance.
    pub papers: Vec<ScoredPaper>,
}

/// Ranking engine. Holds no per-request mutable state; share it behind an `Arc`.
pub struct FeedEngine {
    config: FeedConfig,
    interest_store: Arc<dyn InterestStore>,
    corpus: Arc<dyn PaperCorpus>,
    embedder: Arc<dyn Embedder>,
}

impl FeedEngine {
    /// Create a new feed engine.
    ///
    /// # Errors
    /// Returns an error if configuration is invalid or the embedder's
    /// dimensionality disagrees with the configured one.
    pub fn new(config: FeedConfig, backends: FeedBackends) -> FeedResult<Self> {
        config.validate()?;
        if backends.embedder.ndims() != config.embedding.ndims {
            return Err(FeedError::DimensionMismatch {
                context: format!("embedder {}", backends.embedder.model_name()),
                expected: config.embedding.ndims,
                found: backends.embedder.ndims(),
            });
        }

        Ok(Self {
            config,
            interest_store: backends.interest_store,
            corpus: backends.corpus,
            embedder: backends.embedder,
        })
    }

    /// Create a new engine using `SQLite` backends.
    ///
    /// # Errors
    /// Returns an error if backends cannot be initialized.
    pub async fn from_config(config: FeedConfig) -> FeedResult<Self> {
        let backends = FeedBackends::sqlite(&config).await?;
        Self::new(config, backends)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Paper corpus handle, for ingestion.
    #[must_use]
    pub fn corpus(&self) -> Arc<dyn PaperCorpus> {
        Arc::clone(&self.corpus)
    }

    /// Embedder handle, for ingestion.
    #[must_use]
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    /// Check that the corpus was built with the embedder's dimensionality.
    ///
    /// Meant to run once at startup; an empty corpus passes.
    ///
    /// # Errors
    /// Returns `FeedError::DimensionMismatch` on model/corpus version skew.
    pub async fn verify_dimensions(&self) -> FeedResult<()> {
        let expected = self.embedder.ndims();
        match self.corpus.dimension().await? {
            Some(found) if found != expected => {
                error!(expected, found, model = self.embedder.model_name(), "corpus dimension mismatch");
                Err(FeedError::DimensionMismatch {
                    context: "corpus vs embedding model".to_string(),
                    expected,
                    found,
                })
            }
            Some(_) => Ok(()),
            None => {
                info!("corpus is empty, skipping dimension check");
                Ok(())
            }
        }
    }

    /// Replace a user's interests.
    ///
    /// Input is validated before the store is touched. The write carries no
    /// deadline: a replace closure runs to completion on the writer session
    /// once queued, so cutting it off would report failure for a write that
    /// still commits. Transient errors are retried.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` for bad input, or a storage error.
    pub async fn update_interests(
        &self,
        user_id: &str,
        interests: Vec<String>,
    ) -> FeedResult<InterestUpdate> {
        let user_id = UserId::parse(user_id)?;
        let interests = InterestSet::validated(interests, &self.config.interests)?;
        retry_transient(&self.config.retry, "interest replace", || {
            self.interest_store.replace(&user_id, &interests)
        })
        .await?;

        info!(user_id = %user_id, interests = interests.len(), "updated interests");
        Ok(InterestUpdate {
            user_id,
            stored: interests.len(),
        })
    }

    /// Rank the corpus for a user, keeping scores.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` for a bad user id, or any dependency
    /// failure along the pipeline.
    pub async fn rank(&self, user_id: &str) -> FeedResult<RankedFeed> {
        let user_id = UserId::parse(user_id)?;
        let started = Instant::now();
        let timeouts = &self.config.timeouts;
        let retrieval = &self.config.retrieval;

        let query = retry_transient(&self.config.retry, "interest lookup", || {
            with_timeout(
                "interest lookup",
                timeouts.store_ms,
                resolve_query_text(self.interest_store.as_ref(), &user_id, &retrieval.fallback_query),
            )
        })
        .await?;

        let vector = with_timeout(
            "embedding",
            timeouts.embed_ms,
            self.embedder.embed_text(&query.text),
        )
        .await?;

        let scored = retry_transient(&self.config.retry, "corpus scoring", || {
            with_timeout(
                "corpus scoring",
                timeouts.corpus_ms,
                self.corpus
                    .top_k(retrieval.top_k, &vector, &self.config.scoring),
            )
        })
        .await?;

        let papers = select_top_k(scored, retrieval.top_k);
        debug!(
            user_id = %user_id,
            source = ?query.source,
            returned = papers.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "ranked papers"
        );
        Ok(RankedFeed { query, papers })
    }

    /// Fetch the top papers for a user in relevance order, without scores.
    ///
    /// # Errors
    /// Same as [`FeedEngine::rank`].
    pub async fn fetch_ranked_papers(&self, user_id: &str) -> FeedResult<Vec<PaperSummary>> {
        let feed = self.rank(user_id).await?;
        Ok(feed.papers.into_iter().map(|scored| scored.paper).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::feed::core::config::ScoringWeights;
    use crate::feed::core::errors::ErrorKind;
    use crate::feed::core::paper::{FieldVectors, PaperRecord};
    use crate::feed::core::vector::Vector;
    use crate::feed::embedding::EmbedFuture;
    use crate::feed::retrieval::resolver::QuerySource;
    use crate::feed::retrieval::scoring;
    use crate::feed::storage::interest_store::StoreFuture;

    /// Maps known texts to fixed vectors and records every request.
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        default: Vec<f32>,
        seen: Mutex<Vec<String>>,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, [f32; 3])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, v)| ((*text).to_string(), v.to_vec()))
                    .collect(),
                default: vec![0.0, 0.0, 1.0],
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Embedder for TableEmbedder {
        fn embed_text(&self, text: &str) -> EmbedFuture<'_, FeedResult<Vector>> {
            self.seen.lock().unwrap().push(text.to_string());
            let raw = self.table.get(text).cloned().unwrap_or_else(|| self.default.clone());
            Box::pin(async move { Vector::normalized(raw) })
        }

        fn ndims(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    /// Interest store that fails with a closed connection a few times.
    struct FlakyStore {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl InterestStore for FlakyStore {
        fn replace<'a>(
            &'a self,
            _user_id: &UserId,
            _interests: &InterestSet,
        ) -> StoreFuture<'a, FeedResult<()>> {
            Box::pin(async move { self.attempt().map(|_| ()) })
        }

        fn get<'a>(&'a self, _user_id: &UserId) -> StoreFuture<'a, FeedResult<Option<InterestSet>>> {
            Box::pin(async move { self.attempt() })
        }
    }

    impl FlakyStore {
        fn attempt(&self) -> FeedResult<Option<InterestSet>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(FeedError::TokioSqlite(tokio_rusqlite::Error::ConnectionClosed));
            }
            Ok(None)
        }
    }

    fn paper(title: &str, abstract_v: [f32; 3], title_v: [f32; 3], kw: [f32; 3]) -> PaperRecord {
        PaperRecord {
            summary: PaperSummary {
                title: title.to_string(),
                topics: "Computer Science".to_string(),
                abstract_text: format!("About {title}"),
                doi: None,
                pub_date: Some("2023-05-01".to_string()),
                authorships: serde_json::json!([]),
            },
            vectors: FieldVectors {
                title: title_v.to_vec(),
                abstract_vector: abstract_v.to_vec(),
                keywords: kw.to_vec(),
            },
        }
    }

    fn test_config() -> FeedConfig {
        let mut config = FeedConfig::default();
        config.embedding.ndims = 3;
        config.retry.backoff_base_ms = 1;
        config.retry.backoff_max_ms = 2;
        config
    }

    async fn engine_with(embedder: Arc<TableEmbedder>, papers: Vec<PaperRecord>) -> FeedEngine {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let interest_store = Arc::new(SqliteInterestStore::new(pool.clone()).await.unwrap());
        let corpus = Arc::new(SqlitePaperCorpus::new(pool).await.unwrap());
        for p in papers {
            corpus.insert(p).await.unwrap();
        }
        FeedEngine::new(
            test_config(),
            FeedBackends {
                interest_store,
                corpus,
                embedder,
            },
        )
        .unwrap()
    }

    fn three_papers() -> Vec<PaperRecord> {
        vec![
            paper("graphs", [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            paper("ml systems", [0.8, 0.6, 0.0], [1.0, 0.0, 0.0], [0.6, 0.8, 0.0]),
            paper("query engines", [0.6, 0.8, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ]
    }

    fn many_papers(n: usize) -> Vec<PaperRecord> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = (i as f32 + 1.0) / (n as f32 + 1.0);
                let v = [x, 1.0 - x, 0.5];
                paper(&format!("paper {i}"), v, v, v)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_interests_scores_match_formula_and_sort() {
        let embedder = Arc::new(TableEmbedder::new(&[(
            "machine learning, databases",
            [1.0, 0.0, 0.0],
        )]));
        let records = three_papers();
        let engine = engine_with(Arc::clone(&embedder), records.clone()).await;

        engine
            .update_interests("u1", vec!["machine learning".to_string(), "databases".to_string()])
            .await
            .unwrap();
        let feed = engine.rank("u1").await.unwrap();

        assert_eq!(feed.query.source, QuerySource::Interests);
        assert_eq!(embedder.seen(), vec!["machine learning, databases".to_string()]);
        assert_eq!(feed.papers.len(), 3);
        assert!(feed.papers.windows(2).all(|w| w[0].relevance >= w[1].relevance));

        let q = [1.0_f32, 0.0, 0.0];
        for scored in &feed.papers {
            let r = records
                .iter()
                .find(|r| r.summary.title == scored.paper.title)
                .unwrap();
            let expected = 0.5 * scoring::dot(&q, &r.vectors.abstract_vector)
                + 0.3 * scoring::dot(&q, &r.vectors.title)
                + 0.2 * scoring::dot(&q, &r.vectors.keywords);
            assert!((scored.relevance - expected).abs() < 1e-6);
        }
        // ml systems: 0.5*0.8 + 0.3*1 + 0.2*0.6 = 0.82; query engines: 0.3 + 0 + 0.2 = 0.5
        assert_eq!(feed.papers[0].paper.title, "ml systems");
        assert!((feed.papers[0].relevance - 0.82).abs() < 1e-6);
        assert_eq!(feed.papers[1].paper.title, "query engines");
        assert!((feed.papers[1].relevance - 0.5).abs() < 1e-6);
        assert_eq!(feed.papers[2].paper.title, "graphs");
    }

    #[tokio::test]
    async fn test_unknown_user_embeds_fallback() {
        let embedder = Arc::new(TableEmbedder::new(&[("research", [0.6, 0.8, 0.0])]));
        let engine = engine_with(Arc::clone(&embedder), many_papers(20)).await;

        let papers = engine.fetch_ranked_papers("u2").await.unwrap();

        assert_eq!(embedder.seen(), vec!["research".to_string()]);
        assert_eq!(papers.len(), 15);
    }

    #[tokio::test]
    async fn test_cleared_interests_match_fallback() {
        let embedder = Arc::new(TableEmbedder::new(&[
            ("research", [0.6, 0.8, 0.0]),
            ("optics", [0.0, 0.0, 1.0]),
        ]));
        let engine = engine_with(Arc::clone(&embedder), many_papers(20)).await;

        engine.update_interests("u1", vec!["optics".to_string()]).await.unwrap();
        engine.update_interests("u1", Vec::new()).await.unwrap();

        let cleared = engine.rank("u1").await.unwrap();
        let never_set = engine.rank("u2").await.unwrap();

        assert_eq!(cleared.query.source, QuerySource::Fallback);
        assert_eq!(cleared.query, never_set.query);
        assert_eq!(cleared.papers, never_set.papers);
        assert_eq!(embedder.seen(), vec!["research".to_string(), "research".to_string()]);
    }

    #[tokio::test]
    async fn test_fewer_papers_than_k() {
        let embedder = Arc::new(TableEmbedder::new(&[]));
        let engine = engine_with(embedder, many_papers(4)).await;
        assert_eq!(engine.fetch_ranked_papers("u2").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_ranking_is_deterministic() {
        let embedder = Arc::new(TableEmbedder::new(&[("research", [0.6, 0.8, 0.0])]));
        let engine = engine_with(embedder, many_papers(20)).await;
        let first = engine.rank("u2").await.unwrap();
        let second = engine.rank("u2").await.unwrap();
        assert_eq!(first.papers, second.papers);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_side_effects() {
        let embedder = Arc::new(TableEmbedder::new(&[]));
        let engine = engine_with(Arc::clone(&embedder), three_papers()).await;

        let err = engine.fetch_ranked_papers("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(embedder.seen().is_empty());

        engine.update_interests("u1", vec!["graphs".to_string()]).await.unwrap();
        let err = engine
            .update_interests("u1", vec!["ok".to_string(), String::new()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let feed = engine.rank("u1").await.unwrap();
        assert_eq!(feed.query.text, "graphs");
    }

    #[tokio::test]
    async fn test_update_ack_counts_interests() {
        let engine = engine_with(Arc::new(TableEmbedder::new(&[])), Vec::new()).await;
        let ack = engine
            .update_interests("u1", vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(ack.user_id.as_str(), "u1");
        assert_eq!(ack.stored, 2);
    }

    #[tokio::test]
    async fn test_dimension_skew_fails_loudly() {
        let embedder = Arc::new(TableEmbedder::new(&[]));
        let skewed = vec![PaperRecord {
            vectors: FieldVectors {
                title: vec![1.0, 0.0],
                abstract_vector: vec![1.0, 0.0],
                keywords: vec![1.0, 0.0],
            },
            ..paper("flat", [0.0; 3], [0.0; 3], [0.0; 3])
        }];
        let engine = engine_with(embedder, skewed).await;

        let err = engine.verify_dimensions().await.unwrap_err();
        assert!(matches!(err, FeedError::DimensionMismatch { expected: 3, found: 2, .. }));

        let err = engine.fetch_ranked_papers("u2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);
    }

    #[tokio::test]
    async fn test_embedder_dims_checked_at_construction() {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let mut config = test_config();
        config.embedding.ndims = 384;
        let backends = FeedBackends {
            interest_store: Arc::new(SqliteInterestStore::new(pool.clone()).await.unwrap()),
            corpus: Arc::new(SqlitePaperCorpus::new(pool).await.unwrap()),
            embedder: Arc::new(TableEmbedder::new(&[])),
        };
        assert!(FeedEngine::new(config, backends).is_err());
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let mut config = test_config();
        config.scoring = ScoringWeights {
            abstract_weight: 0.5,
            title_weight: 0.5,
            keywords_weight: 0.5,
        };
        let backends = FeedBackends {
            interest_store: Arc::new(SqliteInterestStore::new(pool.clone()).await.unwrap()),
            corpus: Arc::new(SqlitePaperCorpus::new(pool).await.unwrap()),
            embedder: Arc::new(TableEmbedder::new(&[])),
        };
        assert!(matches!(
            FeedEngine::new(config, backends),
            Err(FeedError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_transient_store_failures_are_retried() {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let store = Arc::new(FlakyStore {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        });
        let embedder = Arc::new(TableEmbedder::new(&[]));
        let engine = FeedEngine::new(
            test_config(),
            FeedBackends {
                interest_store: Arc::clone(&store) as Arc<dyn InterestStore>,
                corpus: Arc::new(SqlitePaperCorpus::new(pool).await.unwrap()),
                embedder: Arc::clone(&embedder) as Arc<dyn Embedder>,
            },
        )
        .unwrap();

        let feed = engine.rank("u1").await.unwrap();
        assert_eq!(feed.query.source, QuerySource::Fallback);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);

        store.failures_left.store(10, Ordering::SeqCst);
        let err = engine.rank("u1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(embedder.seen().len(), 1);
    }

    struct SlowEmbedder;

    impl Embedder for SlowEmbedder {
        fn embed_text(&self, _text: &str) -> EmbedFuture<'_, FeedResult<Vector>> {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                Vector::normalized(vec![1.0, 0.0, 0.0])
            })
        }

        fn ndims(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_slow_embedding_times_out() {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let mut config = test_config();
        config.timeouts.embed_ms = 10;
        let engine = FeedEngine::new(
            config,
            FeedBackends {
                interest_store: Arc::new(SqliteInterestStore::new(pool.clone()).await.unwrap()),
                corpus: Arc::new(SqlitePaperCorpus::new(pool).await.unwrap()),
                embedder: Arc::new(SlowEmbedder),
            },
        )
        .unwrap();

        let err = engine.fetch_ranked_papers("u1").await.unwrap_err();
        assert!(matches!(err, FeedError::Timeout { operation: "embedding", .. }));
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    /// Interest store whose writes outlast the configured store deadline.
    struct SlowWriteStore {
        inner: SqliteInterestStore,
    }

    impl InterestStore for SlowWriteStore {
        fn replace<'a>(
            &'a self,
            user_id: &UserId,
            interests: &InterestSet,
        ) -> StoreFuture<'a, FeedResult<()>> {
            let user_id = user_id.clone();
            let interests = interests.clone();
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                self.inner.replace(&user_id, &interests).await
            })
        }

        fn get<'a>(&'a self, user_id: &UserId) -> StoreFuture<'a, FeedResult<Option<InterestSet>>> {
            self.inner.get(user_id)
        }
    }

    #[tokio::test]
    async fn test_slow_interest_write_is_not_cut_off() {
        let pool = ConnectionPool::in_memory().await.unwrap();
        let mut config = test_config();
        config.timeouts.store_ms = 5;
        let engine = FeedEngine::new(
            config,
            FeedBackends {
                interest_store: Arc::new(SlowWriteStore {
                    inner: SqliteInterestStore::new(pool.clone()).await.unwrap(),
                }),
                corpus: Arc::new(SqlitePaperCorpus::new(pool).await.unwrap()),
                embedder: Arc::new(TableEmbedder::new(&[])),
            },
        )
        .unwrap();

        let ack = engine
            .update_interests("u1", vec!["optics".to_string()])
            .await
            .unwrap();
        assert_eq!(ack.stored, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_pool_serves_concurrent_updates_and_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.storage.sqlite_path = dir.path().join("feed.sqlite");
        config.storage.read_pool_size = 3;

        let pool = ConnectionPool::open(&config.storage).await.unwrap();
        assert_eq!(pool.read_sessions(), 3);
        let interest_store = Arc::new(SqliteInterestStore::new(pool.clone()).await.unwrap());
        let corpus = Arc::new(SqlitePaperCorpus::new(pool).await.unwrap());
        for p in many_papers(30) {
            corpus.insert(p).await.unwrap();
        }
        let embedder = Arc::new(TableEmbedder::new(&[
            ("research", [1.0, 0.0, 0.0]),
            ("optics", [0.0, 1.0, 0.0]),
        ]));
        let engine = Arc::new(
            FeedEngine::new(
                config,
                FeedBackends {
                    interest_store,
                    corpus,
                    embedder,
                },
            )
            .unwrap(),
        );

        let mut tasks = Vec::new();
        for i in 0..40 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                let user = format!("user-{}", i % 5);
                if i % 2 == 0 {
                    engine
                        .update_interests(&user, vec!["optics".to_string()])
                        .await
                        .map(|_| ())
                } else {
                    engine.fetch_ranked_papers(&user).await.map(|_| ())
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Writes through the writer session are visible on the read sessions.
        for _ in 0..3 {
            let feed = engine.rank("user-0").await.unwrap();
            assert_eq!(feed.query.text, "optics");
        }

        let fallback = engine.rank("nobody").await.unwrap();
        assert_eq!(fallback.query.source, QuerySource::Fallback);
        assert_eq!(fallback.papers.len(), 15);
        assert_eq!(fallback.papers[0].paper.title, "paper 29");
        assert!(fallback.papers.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }
}
