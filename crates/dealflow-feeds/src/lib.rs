//! Feed adapter: fetches and parses RSS/Atom feeds into normalized deal
//! candidates.
//!
//! Fetch-level failures (network, DNS, non-2xx) abort the whole source for
//! the current crawl cycle and are surfaced to the scheduler. Entry-level
//! problems never do: a malformed or incomplete entry is logged, counted,
//! and skipped so the rest of the feed still lands.

mod error;
mod fetch;
mod parse;
mod types;

pub use error::FeedError;
pub use fetch::fetch_feed;
pub use parse::{derive_guid, parse_feed, FeedParseOutcome};
pub use types::FeedCandidate;
