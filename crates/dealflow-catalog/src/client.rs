//! HTTP client for the catalog search API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use dealflow_core::money::discount_percent;

use crate::error::CatalogError;
use crate::mock;
use crate::throttle::Throttle;
use crate::types::{CatalogDeal, SearchItem, SearchParams, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://webservices.amazon.com/paapi5/";

/// Client for the product-advertising search API.
///
/// Holds the HTTP client, optional API key, and the shared outbound
/// [`Throttle`]. Use [`CatalogClient::new`] for production or
/// [`CatalogClient::with_base_url`] to point at a mock server in tests.
/// Without an API key the client never touches the network and serves
/// deterministic mock results instead.
pub struct CatalogClient {
    client: Client,
    api_key: Option<String>,
    search_url: Url,
    throttle: Throttle,
}

impl CatalogClient {
    /// Creates a new client pointed at the production catalog API.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        min_request_gap: Duration,
    ) -> Result<Self, CatalogError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, min_request_gap, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CatalogError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        min_request_gap: Duration,
        base_url: &str,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise to exactly one trailing slash so join() appends the
        // operation path instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .and_then(|base| base.join("searchitems"))
            .map_err(|e| CatalogError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key,
            search_url,
            throttle: Throttle::new(min_request_gap),
        })
    }

    /// Searches the catalog and maps results into normalized candidates.
    ///
    /// Items lacking a buyable offer are dropped. Discount percentages are
    /// recomputed from the returned price pair, never read off the wire.
    ///
    /// An HTTP 429 degrades to an empty result set (the caller's sync sees
    /// "zero new items" rather than an error); all other failures propagate.
    /// Data is never fabricated on a live-API failure; mock results exist
    /// only for the credential-less configuration.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Http`] on network failure.
    /// - [`CatalogError::UnexpectedStatus`] on a non-2xx, non-429 response.
    /// - [`CatalogError::Deserialize`] if the body is not the expected shape.
    pub async fn search_deals(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<CatalogDeal>, CatalogError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!("catalog API key not configured; serving deterministic mock results");
            return Ok(mock::mock_deals(params));
        };

        self.throttle.wait().await;

        let url = self.build_search_url(api_key, params);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("catalog API rate limited; degrading to empty result set");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.search_url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                context: "searchitems".to_owned(),
                source: e,
            })?;

        let total = parsed.items.len();
        let deals: Vec<CatalogDeal> = parsed.items.into_iter().filter_map(map_item).collect();
        if deals.len() < total {
            tracing::debug!(
                dropped = total - deals.len(),
                "dropped catalog items without an offer"
            );
        }
        Ok(deals)
    }

    /// Builds the search request URL with percent-encoded query parameters.
    fn build_search_url(&self, api_key: &str, params: &SearchParams) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", api_key);
            if let Some(keywords) = &params.keywords {
                pairs.append_pair("keywords", keywords);
            }
            if let Some(category) = &params.category {
                pairs.append_pair("category", category);
            }
            if let Some(sort_by) = &params.sort_by {
                pairs.append_pair("sort", sort_by);
            }
            if let Some(count) = params.item_count {
                pairs.append_pair("count", &count.to_string());
            }
            if let Some(min_price) = params.min_price {
                pairs.append_pair("min_price", &min_price.to_string());
            }
            if let Some(max_price) = params.max_price {
                pairs.append_pair("max_price", &max_price.to_string());
            }
        }
        url
    }
}

/// Maps one wire item into a candidate; `None` drops it (no offer).
fn map_item(item: SearchItem) -> Option<CatalogDeal> {
    let offer = item.offer?;
    let original_price = offer.list_price.unwrap_or(offer.price);
    Some(CatalogDeal {
        asin: item.asin,
        title: item.title,
        description: item.description,
        price: offer.price,
        original_price,
        discount_percent: discount_percent(offer.price, original_price),
        image_url: item.image_url,
        product_url: item.detail_page_url,
        category: item.category.unwrap_or_else(|| "general".to_owned()),
    })
}
