//! Paper records as stored in the corpus and returned to clients.

use serde::{Deserialize, Serialize};

use crate::feed::core::errors::{FeedError, FeedResult};

/// Externally visible paper shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    /// Paper title.
    pub title: String,
    /// Topic labels, as stored.
    #[serde(default)]
    pub topics: String,
    /// Abstract text.
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// DOI link or identifier.
    #[serde(default)]
    pub doi: Option<String>,
    /// Publication date, as stored (usually `YYYY-MM-DD`).
    #[serde(default)]
    pub pub_date: Option<String>,
    /// Structured authorship list, e.g. `[{"author": {"display_name": ".."}}]`.
    #[serde(default = "empty_authorships")]
    pub authorships: serde_json::Value,
}

fn empty_authorships() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

/// The three precomputed per-paper field vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldVectors {
    /// Embedding of the title.
    pub title: Vec<f32>,
    /// Embedding of the abstract.
    pub abstract_vector: Vec<f32>,
    /// Embedding of the keywords.
    pub keywords: Vec<f32>,
}

impl FieldVectors {
    /// Shared dimensionality of the three vectors.
    ///
    /// # Errors
    /// Returns `FeedError::DimensionMismatch` if the vectors disagree, or
    /// `FeedError::InvalidVector` if they are empty.
    pub fn dimension(&self) -> FeedResult<usize> {
        let dims = self.abstract_vector.len();
        if dims == 0 {
            return Err(FeedError::InvalidVector(
                "field vectors must not be empty".to_string(),
            ));
        }
        for (field, len) in [("title", self.title.len()), ("keywords", self.keywords.len())] {
            if len != dims {
                return Err(FeedError::DimensionMismatch {
                    context: format!("{field} vector"),
                    expected: dims,
                    found: len,
                });
            }
        }
        Ok(dims)
    }
}

/// A paper as ingested into the corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct PaperRecord {
    /// Visible fields.
    pub summary: PaperSummary,
    /// Precomputed field vectors.
    pub vectors: FieldVectors,
}

/// A paper paired with its relevance for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPaper {
    /// Weighted similarity to the query vector.
    pub relevance: f64,
    /// Visible fields.
    pub paper: PaperSummary,
}
