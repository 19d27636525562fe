//! Persistence of normalized candidates with source-native dedup.
//!
//! Feed candidates dedup on `guid`, catalog candidates on `asin`. Both rely
//! on the unique index, so concurrent crawls of overlapping sources cannot
//! double-insert.

use serde::Serialize;
use sqlx::PgPool;

use dealflow_catalog::{CatalogClient, SearchParams};
use dealflow_db::{insert_feed_deal_if_new, insert_pending_deal_if_new, NewFeedDeal, NewPendingDeal};
use dealflow_feeds::FeedCandidate;

use crate::error::IngestError;

/// Counters for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncOutcome {
    /// Rows newly created.
    pub created: usize,
    /// Candidates dropped as duplicates or by filters.
    pub skipped: usize,
    /// Candidates considered (`created + skipped`).
    pub total: usize,
}

impl SyncOutcome {
    fn record(&mut self, created: bool) {
        self.total += 1;
        if created {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Persists feed candidates for one source, skipping guids already seen.
///
/// A failed insert is logged and counted as skipped; the rest of the batch
/// still lands.
///
/// # Errors
///
/// Currently infallible per item; the `Result` covers future batch-level
/// failures and keeps the signature aligned with [`sync_catalog_deals`].
pub async fn ingest_feed_candidates(
    pool: &PgPool,
    source_id: i64,
    candidates: Vec<FeedCandidate>,
) -> Result<SyncOutcome, IngestError> {
    let mut outcome = SyncOutcome::default();
    for candidate in candidates {
        let guid = candidate.guid.clone();
        let deal = feed_candidate_to_row(candidate, source_id);
        match insert_feed_deal_if_new(pool, &deal).await {
            Ok(created) => outcome.record(created),
            Err(e) => {
                tracing::error!(guid = %guid, error = %e, "failed to persist feed candidate");
                outcome.record(false);
            }
        }
    }
    Ok(outcome)
}

fn feed_candidate_to_row(candidate: FeedCandidate, source_id: i64) -> NewFeedDeal {
    NewFeedDeal {
        guid: candidate.guid,
        title: candidate.title,
        description: candidate.description,
        link: candidate.link,
        image_url: candidate.image_url,
        category: candidate.category,
        price: candidate.price,
        original_price: candidate.original_price,
        discount_percent: candidate.discount_percent,
        store_name: candidate.store_name,
        coupon_code: candidate.coupon_code,
        published_at: candidate.published_at,
        expires_at: None,
        source_id,
    }
}

/// Searches the catalog API and queues new results for moderation.
///
/// The minimum-discount filter is applied here rather than in the API
/// client, so filtered items show up as skipped in the outcome instead of
/// silently vanishing. Asins already in the queue (any status) are skipped;
/// a rejected deal stays rejected across re-syncs.
///
/// # Errors
///
/// Returns [`IngestError::Catalog`] if the search fails, or
/// [`IngestError::Db`] if the queue insert fails.
pub async fn sync_catalog_deals(
    pool: &PgPool,
    catalog: &CatalogClient,
    params: &SearchParams,
) -> Result<SyncOutcome, IngestError> {
    let deals = catalog.search_deals(params).await?;

    let mut outcome = SyncOutcome::default();
    for deal in deals {
        if let Some(min_discount) = params.min_discount_percent {
            if deal.discount_percent < min_discount {
                outcome.record(false);
                continue;
            }
        }
        let created = insert_pending_deal_if_new(
            pool,
            &NewPendingDeal {
                asin: deal.asin,
                title: deal.title,
                description: deal.description,
                price: deal.price,
                original_price: deal.original_price,
                discount_percent: deal.discount_percent,
                image_url: deal.image_url,
                product_url: deal.product_url,
                category: deal.category,
            },
        )
        .await?;
        outcome.record(created);
    }

    tracing::info!(
        created = outcome.created,
        skipped = outcome.skipped,
        total = outcome.total,
        "catalog sync complete"
    );
    Ok(outcome)
}
