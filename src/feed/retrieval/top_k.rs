//! Top-K selection over scored papers.

use std::cmp::Ordering;

use crate::feed::core::paper::ScoredPaper;

/// Default number of papers returned per request.
pub const DEFAULT_TOP_K: usize = 15;

/// Order descending by relevance and keep at most `k` papers.
///
/// The sort is stable, so exact ties keep their input order. NaN scores
/// sort last.
#[must_use]
pub fn select_top_k(mut scored: Vec<ScoredPaper>, k: usize) -> Vec<ScoredPaper> {
    scored.sort_by(|a, b| descending(a.relevance, b.relevance));
    scored.truncate(k);
    scored
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
