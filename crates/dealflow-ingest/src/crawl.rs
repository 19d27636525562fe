//! Crawl orchestration: fetch, parse, and persist one source at a time,
//! with bounded concurrency across due sources.

use futures::{stream, FutureExt, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use dealflow_db::{
    get_source, list_active_sources, list_due_sources, mark_crawl_failure, mark_crawl_success,
    FeedSourceRow,
};
use dealflow_feeds::{fetch_feed, parse_feed};

use crate::error::IngestError;
use crate::ingest::ingest_feed_candidates;

/// Outcome of crawling one source.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub source_id: Uuid,
    pub source_name: String,
    pub success: bool,
    /// Entries seen in the feed, including duplicates.
    pub items_crawled: usize,
    /// Rows newly created by this crawl.
    pub new_items: usize,
    pub errors: Vec<String>,
}

/// Crawls a single source end to end and records the attempt in the
/// registry.
///
/// One bad entry never aborts the batch: per-entry parse failures are
/// collected into the report while the remaining entries still land. A
/// fetch or whole-document parse failure marks the attempt failed without
/// touching `last_crawled_at`, so the source retries on the next tick.
pub async fn crawl_source(
    pool: &PgPool,
    client: &reqwest::Client,
    source: &FeedSourceRow,
) -> CrawlReport {
    let mut report = CrawlReport {
        source_id: source.public_id,
        source_name: source.name.clone(),
        success: false,
        items_crawled: 0,
        new_items: 0,
        errors: Vec::new(),
    };

    let body = match fetch_feed(client, &source.url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(source = %source.name, error = %e, "feed fetch failed");
            record_failure(pool, source.id, &e.to_string()).await;
            report.errors.push(e.to_string());
            return report;
        }
    };

    let parsed = match parse_feed(&body, &source.category) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(source = %source.name, error = %e, "feed parse failed");
            record_failure(pool, source.id, &e.to_string()).await;
            report.errors.push(e.to_string());
            return report;
        }
    };

    report.items_crawled = parsed.candidates.len();
    report.errors = parsed.errors;

    match ingest_feed_candidates(pool, source.id, parsed.candidates).await {
        Ok(outcome) => {
            report.new_items = outcome.created;
        }
        Err(e) => {
            tracing::error!(source = %source.name, error = %e, "feed ingest failed");
            record_failure(pool, source.id, &e.to_string()).await;
            report.errors.push(e.to_string());
            return report;
        }
    }

    report.success = true;
    let entry_errors = if report.errors.is_empty() {
        None
    } else {
        Some(report.errors.join("; "))
    };
    let new_items = i64::try_from(report.new_items).unwrap_or(i64::MAX);
    if let Err(e) =
        mark_crawl_success(pool, source.id, new_items, entry_errors.as_deref()).await
    {
        tracing::error!(source = %source.name, error = %e, "failed to record crawl success");
    }

    tracing::info!(
        source = %source.name,
        items = report.items_crawled,
        new_items = report.new_items,
        entry_errors = report.errors.len(),
        "crawl complete"
    );
    report
}

async fn record_failure(pool: &PgPool, source_id: i64, error: &str) {
    if let Err(e) = mark_crawl_failure(pool, source_id, error).await {
        tracing::error!(source_id, error = %e, "failed to record crawl failure");
    }
}

/// Crawls every due source with at most `concurrency` sources in flight.
///
/// A source failure produces a failed report, never an early return, so one
/// dead feed cannot starve the others.
///
/// # Errors
///
/// Returns [`IngestError::Db`] only if the due-source query itself fails.
pub async fn crawl_due_sources(
    pool: &PgPool,
    client: &reqwest::Client,
    concurrency: usize,
) -> Result<Vec<CrawlReport>, IngestError> {
    let due = list_due_sources(pool).await?;
    if due.is_empty() {
        tracing::debug!("no sources due for crawl");
        return Ok(Vec::new());
    }
    tracing::info!(due = due.len(), "starting crawl of due sources");
    Ok(crawl_batch(pool, client, &due, concurrency).await)
}

async fn crawl_batch(
    pool: &PgPool,
    client: &reqwest::Client,
    sources: &[FeedSourceRow],
    concurrency: usize,
) -> Vec<CrawlReport> {
    let futures: Vec<_> = sources
        .iter()
        .map(|source| crawl_source(pool, client, source).boxed())
        .collect();
    let reports: Vec<CrawlReport> = stream::iter(futures)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let failed = reports.iter().filter(|r| !r.success).count();
    if failed > 0 {
        tracing::warn!(failed, total = reports.len(), "some sources failed to crawl");
    }
    reports
}

/// Crawls one source by public id, or every active source when `source_id`
/// is `None`. Backs the manual crawl endpoint and CLI command; a manual
/// trigger ignores per-source interval scheduling, so a recently crawled
/// source is crawled again.
///
/// # Errors
///
/// Returns [`IngestError::NotFound`] if the requested source does not
/// exist, or [`IngestError::Db`] on query failure.
pub async fn crawl_on_demand(
    pool: &PgPool,
    client: &reqwest::Client,
    concurrency: usize,
    source_id: Option<Uuid>,
) -> Result<Vec<CrawlReport>, IngestError> {
    match source_id {
        Some(public_id) => {
            let source = get_source(pool, public_id)
                .await?
                .ok_or(IngestError::NotFound)?;
            Ok(vec![crawl_source(pool, client, &source).await])
        }
        None => {
            let active = list_active_sources(pool).await?;
            tracing::info!(sources = active.len(), "starting on-demand crawl");
            Ok(crawl_batch(pool, client, &active, concurrency).await)
        }
    }
}
