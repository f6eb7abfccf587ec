//! Interest sets owned by a single user.

use serde::{Deserialize, Serialize};

use crate::feed::core::config::InterestLimits;
use crate::feed::core::errors::{FeedError, FeedResult};

/// Separator used when an interest set is reduced to query text.
pub const INTEREST_SEPARATOR: &str = ", ";

/// Ordered free-text research interests of one user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSet(Vec<String>);

impl InterestSet {
    /// Validate a raw payload against configured limits.
    ///
    /// An empty list is valid and clears the user's interests.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` if there are too many entries or an
    /// entry is blank or too long.
    pub fn validated(interests: Vec<String>, limits: &InterestLimits) -> FeedResult<Self> {
        if interests.len() > limits.max_interests {
            return Err(FeedError::Validation(format!(
                "at most {} interests are allowed, got {}",
                limits.max_interests,
                interests.len()
            )));
        }
        for (index, interest) in interests.iter().enumerate() {
            if interest.trim().is_empty() {
                return Err(FeedError::Validation(format!(
                    "interest #{index} must not be blank"
                )));
            }
            let chars = interest.chars().count();
            if chars > limits.max_interest_chars {
                return Err(FeedError::Validation(format!(
                    "interest #{index} exceeds {} characters",
                    limits.max_interest_chars
                )));
            }
        }
        Ok(Self(interests))
    }

    /// Wrap values read back from storage without re-validating.
    #[must_use]
    pub const fn from_stored(interests: Vec<String>) -> Self {
        Self(interests)
    }

    /// Whether the set holds no interests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of interests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the interests in stored order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Reduce the set to the single text that gets embedded.
    ///
    /// All stored interests are joined with `", "` in stored order, so every
    /// entry contributes to the query rather than only the first one.
    #[must_use]
    pub fn query_text(&self) -> String {
        self.0.join(INTEREST_SEPARATOR)
    }
}
