//! Identifier types for feed requests.
//!
//! User identifiers are opaque strings minted by the authentication layer in
//! front of this service. They are validated once at the boundary and carried
//! as a newtype afterwards so the store and engine never see raw input.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::feed::core::errors::FeedError;

/// Maximum accepted length of a user identifier in bytes.
pub const MAX_USER_ID_BYTES: usize = 256;

/// Validated user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` if the identifier is blank, too long,
    /// or contains control characters.
    pub fn parse(raw: &str) -> Result<Self, FeedError> {
        if raw.trim().is_empty() {
            return Err(FeedError::Validation("user_id must not be empty".to_string()));
        }
        if raw.len() > MAX_USER_ID_BYTES {
            return Err(FeedError::Validation(format!(
                "user_id must be at most {MAX_USER_ID_BYTES} bytes"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(FeedError::Validation(
                "user_id must not contain control characters".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the identifier text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = FeedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}
