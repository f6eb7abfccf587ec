//! Scalar functions registered on every `SQLite` connection.

use rusqlite::functions::FunctionFlags;
use rusqlite::Error as SqlError;

use crate::feed::core::config::ScoringWeights;
use crate::feed::retrieval::scoring;
use crate::feed::storage::codec::decode_vector;

/// Name of the relevance function.
///
/// `paper_relevance(abstract_vector, title_vector, keywords_vector, query,
/// w_abstract, w_title, w_keywords) -> REAL`
pub const RELEVANCE_FN: &str = "paper_relevance";

/// Register [`RELEVANCE_FN`] on `conn`.
///
/// The function evaluates [`scoring::relevance`] so database-side ranking
/// reproduces the in-process formula exactly. A dimension mismatch raises a
/// SQL error instead of producing a score.
///
/// # Errors
/// Returns an error if `SQLite` rejects the registration.
pub fn register_relevance_function(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        RELEVANCE_FN,
        7,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let decode = |idx: usize| -> rusqlite::Result<Vec<f32>> {
                let blob = ctx
                    .get_raw(idx)
                    .as_blob()
                    .map_err(|e| SqlError::UserFunctionError(Box::new(e)))?;
                decode_vector(blob).map_err(|e| SqlError::UserFunctionError(e.to_string().into()))
            };
            let abstract_vector = decode(0)?;
            let title_vector = decode(1)?;
            let keywords_vector = decode(2)?;
            let query = decode(3)?;
            let weights = ScoringWeights {
                abstract_weight: ctx.get(4)?,
                title_weight: ctx.get(5)?,
                keywords_weight: ctx.get(6)?,
            };
            scoring::relevance(
                &query,
                &abstract_vector,
                &title_vector,
                &keywords_vector,
                &weights,
            )
            .map_err(|e| SqlError::UserFunctionError(e.to_string().into()))
        },
    )
}
