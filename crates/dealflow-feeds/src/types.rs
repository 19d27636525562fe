use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A normalized deal candidate produced from one feed entry, prior to
/// deduplication and persistence.
///
/// Every extracted field is optional; heuristic extraction over
/// untrusted feed text may find nothing.
#[derive(Debug, Clone)]
pub struct FeedCandidate {
    /// Source-native dedup key: the entry's own id when present, otherwise
    /// derived deterministically from the link.
    pub guid: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_url: Option<String>,
    /// The owning source's category, stamped during parsing.
    pub category: String,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub store_name: Option<String>,
    pub coupon_code: Option<String>,
    pub published_at: DateTime<Utc>,
}
