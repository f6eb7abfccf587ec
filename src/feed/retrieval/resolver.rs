//! Interest resolution: user id to the text that gets embedded.

use tracing::info;

use crate::feed::core::errors::FeedResult;
use crate::feed::core::ids::UserId;
use crate::feed::storage::interest_store::InterestStore;

/// Query text used when a user has no stored interests.
pub const FALLBACK_QUERY: &str = "research";

/// Where the query text came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuerySource {
    /// The user's stored interest set.
    Interests,
    /// No interests were stored; the fallback text was used.
    Fallback,
}

/// Text to embed for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Never-empty query text.
    pub text: String,
    /// Origin of `text`.
    pub source: QuerySource,
}

/// Look up the user's interests and reduce them to a single query text.
///
/// Absence (or an empty stored set) maps to `fallback`; the two paths are
/// mutually exclusive. Store failures propagate.
///
/// # Errors
/// Returns an error if the interest store cannot be read.
pub async fn resolve_query_text(
    store: &dyn InterestStore,
    user_id: &UserId,
    fallback: &str,
) -> FeedResult<ResolvedQuery> {
    match store.get(user_id).await? {
        Some(interests) if !interests.is_empty() => Ok(ResolvedQuery {
            text: interests.query_text(),
            source: QuerySource::Interests,
        }),
        _ => {
            info!(user_id = %user_id, fallback, "no stored interests, using fallback query");
            Ok(ResolvedQuery {
                text: fallback.to_string(),
                source: QuerySource::Fallback,
            })
        }
    }
}
