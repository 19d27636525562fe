//! Ingestion pipeline: crawl orchestration, candidate persistence with
//! dedup, moderation transitions, affiliate tagging, and published-deal
//! events.

pub mod affiliate;
pub mod crawl;
pub mod error;
pub mod events;
pub mod ingest;
pub mod moderation;

pub use affiliate::AffiliateTagger;
pub use crawl::{crawl_due_sources, crawl_on_demand, crawl_source, CrawlReport};
pub use error::IngestError;
pub use events::{EventBus, PublishedEvent};
pub use ingest::{ingest_feed_candidates, sync_catalog_deals, SyncOutcome};
pub use moderation::{approve, list_pending, reject, ApprovalOverrides};
