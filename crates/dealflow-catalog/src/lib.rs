//! Structured adapter for the product-advertising catalog API.
//!
//! Wraps `reqwest` with catalog-specific error handling, a process-wide
//! minimum-inter-request throttle, and typed response mapping into
//! normalized deal candidates. When no API key is configured the client
//! serves deterministic mock results instead of failing, so downstream code
//! and tests run without live credentials.

mod client;
mod error;
mod mock;
mod throttle;
mod types;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use throttle::Throttle;
pub use types::{CatalogDeal, SearchParams};
