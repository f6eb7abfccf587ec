//! Corpus loader: embeds papers from a JSON file and stores them.
//!
//! ```bash
//! paperfeed-ingest papers.json
//! ```
//!
//! The file holds an array of `{title, topics, abstract, doi, pub_date,
//! authorships, keywords?}` objects. Keywords default to the topics.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{info, warn};

use paperfeed::feed::core::config::FeedConfig;
use paperfeed::feed::core::paper::{FieldVectors, PaperRecord, PaperSummary};
use paperfeed::feed::embedding::Embedder;
use paperfeed::feed::engine::FeedBackends;
use paperfeed::start_paperfeed::init_tracing;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Keywords {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct IngestPaper {
    #[serde(flatten)]
    summary: PaperSummary,
    #[serde(default)]
    keywords: Option<Keywords>,
}

impl IngestPaper {
    fn keywords_text(&self) -> String {
        match &self.keywords {
            Some(Keywords::Text(text)) if !text.trim().is_empty() => text.clone(),
            Some(Keywords::List(list)) if !list.is_empty() => list.join(", "),
            _ => self.summary.topics.clone(),
        }
    }
}

async fn embed_field(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let vector = embedder.embed_text(text).await?;
    Ok(vector.as_slice().to_vec())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: paperfeed-ingest <papers.json>");
    };

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let papers: Vec<IngestPaper> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let config = FeedConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    let backends = FeedBackends::sqlite(&config).await?;
    let embedder = backends.embedder;
    let corpus = backends.corpus;

    if let Some(dims) = corpus.dimension().await? {
        if dims != embedder.ndims() {
            bail!(
                "corpus holds {dims}-dim vectors but {} produces {}",
                embedder.model_name(),
                embedder.ndims()
            );
        }
    }

    info!(papers = papers.len(), model = embedder.model_name(), "starting ingestion");
    let started = Instant::now();
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for (index, paper) in papers.into_iter().enumerate() {
        if paper.summary.title.trim().is_empty() {
            warn!(index, "skipping paper without a title");
            skipped += 1;
            continue;
        }

        let keywords_text = paper.keywords_text();
        let vectors = FieldVectors {
            title: embed_field(embedder.as_ref(), &paper.summary.title).await?,
            abstract_vector: embed_field(embedder.as_ref(), &paper.summary.abstract_text).await?,
            keywords: embed_field(embedder.as_ref(), &keywords_text).await?,
        };

        let id = corpus
            .insert(PaperRecord {
                summary: paper.summary,
                vectors,
            })
            .await
            .with_context(|| format!("inserting paper #{index}"))?;
        inserted += 1;

        if inserted % 100 == 0 {
            info!(inserted, last_id = id, "progress");
        }
    }

    info!(
        inserted,
        skipped,
        total = corpus.count().await?,
        elapsed_ms = started.elapsed().as_millis(),
        "ingestion finished"
    );
    Ok(())
}
