//! Feed engine orchestration.

pub mod core;
pub mod retry;

pub use core::{FeedBackends, FeedEngine, InterestUpdate, RankedFeed};
pub use retry::{backoff_delay, retry_transient, with_timeout};
