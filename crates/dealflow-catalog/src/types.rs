use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Search parameters for a catalog sync.
///
/// Everything is optional; unset fields fall back to server-side defaults.
/// `min_discount_percent` is not applied by the adapter itself. The
/// ingestion stage filters on it so that filtered items are counted as
/// skipped rather than silently absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub keywords: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub item_count: Option<u32>,
    pub min_discount_percent: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// A normalized candidate produced from one catalog search result.
#[derive(Debug, Clone)]
pub struct CatalogDeal {
    /// Source-native dedup key.
    pub asin: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Decimal,
    /// Always derived from the price pair, never read from the response.
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub product_url: String,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub asin: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub detail_page_url: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Absent when the item currently has no buyable offer; such items are
    /// dropped during mapping.
    #[serde(default)]
    pub offer: Option<SearchOffer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchOffer {
    pub price: Decimal,
    #[serde(default)]
    pub list_price: Option<Decimal>,
}
