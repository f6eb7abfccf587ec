//! Relevance scoring: one query vector against three field vectors.
//!
//! ```text
//! relevance = w_abstract * dot(q, abstract)
//!           + w_title    * dot(q, title)
//!           + w_keywords * dot(q, keywords)
//! ```
//!
//! All vectors are unit-normalized, so each dot product is a cosine
//! similarity in `[-1, 1]` and, with weights summing to 1, so is the blend.
//! No clamping is applied. The `SQLite` corpus evaluates this exact function
//! through a registered scalar function, so in-process and in-database
//! scores are identical.

use crate::feed::core::config::ScoringWeights;
use crate::feed::core::errors::{FeedError, FeedResult};
use crate::feed::core::paper::{PaperRecord, ScoredPaper};

/// Dot product accumulated in `f64`.
///
/// Callers guarantee equal lengths; extra components are ignored.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0_f64, |acc, (x, y)| f64::from(*x).mul_add(f64::from(*y), acc))
}

fn check_dims(field: &str, query: &[f32], field_vector: &[f32]) -> FeedResult<()> {
    if field_vector.len() == query.len() {
        Ok(())
    } else {
        Err(FeedError::DimensionMismatch {
            context: format!("{field} vector"),
            expected: query.len(),
            found: field_vector.len(),
        })
    }
}

/// Weighted relevance of one paper.
///
/// # Errors
/// Returns `FeedError::DimensionMismatch` if any field vector has a different
/// length than the query.
pub fn relevance(
    query: &[f32],
    abstract_vector: &[f32],
    title_vector: &[f32],
    keywords_vector: &[f32],
    weights: &ScoringWeights,
) -> FeedResult<f64> {
    check_dims("abstract", query, abstract_vector)?;
    check_dims("title", query, title_vector)?;
    check_dims("keywords", query, keywords_vector)?;

    let abstract_sim = dot(query, abstract_vector);
    let title_sim = dot(query, title_vector);
    let keywords_sim = dot(query, keywords_vector);

    Ok(weights.keywords_weight.mul_add(
        keywords_sim,
        weights
            .title_weight
            .mul_add(title_sim, weights.abstract_weight * abstract_sim),
    ))
}

/// Score every record in `corpus` against `query`, preserving input order.
///
/// # Errors
/// Fails on the first dimension mismatch rather than skipping the record.
pub fn score_all(
    query: &[f32],
    corpus: &[PaperRecord],
    weights: &ScoringWeights,
) -> FeedResult<Vec<ScoredPaper>> {
    corpus
        .iter()
        .map(|record| {
            let v = &record.vectors;
            let score = relevance(query, &v.abstract_vector, &v.title, &v.keywords, weights)?;
            Ok(ScoredPaper {
                relevance: score,
                paper: record.summary.clone(),
            })
        })
        .collect()
}
