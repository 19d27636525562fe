//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-source failures are reported in the summary rather than
//! propagated so a single bad feed does not abort the full run.

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use dealflow_catalog::{CatalogClient, SearchParams};

pub(crate) async fn run_crawl(
    pool: &sqlx::PgPool,
    config: &dealflow_core::AppConfig,
    source: Option<Uuid>,
) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;

    let reports =
        dealflow_ingest::crawl_on_demand(pool, &client, config.crawl_concurrency, source).await?;

    if reports.is_empty() {
        println!("no active sources to crawl");
        return Ok(());
    }

    for report in &reports {
        let status = if report.success { "ok" } else { "FAILED" };
        println!(
            "{status:<6} {:<30} items={} new={} errors={}",
            report.source_name,
            report.items_crawled,
            report.new_items,
            report.errors.len()
        );
        for error in &report.errors {
            println!("       {error}");
        }
    }

    let new_items: usize = reports.iter().map(|r| r.new_items).sum();
    println!("crawled {} sources, {} new deals", reports.len(), new_items);
    Ok(())
}

pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &dealflow_core::AppConfig,
    keywords: String,
    category: Option<String>,
    count: Option<u32>,
    min_discount: Option<Decimal>,
) -> anyhow::Result<()> {
    let catalog = CatalogClient::new(
        config.catalog_api_key.clone(),
        config.fetch_timeout_secs,
        &config.user_agent,
        Duration::from_millis(config.catalog_min_request_gap_ms),
    )?;

    let params = SearchParams {
        keywords: Some(keywords),
        category,
        item_count: count,
        min_discount_percent: min_discount,
        ..SearchParams::default()
    };
    let outcome = dealflow_ingest::sync_catalog_deals(pool, &catalog, &params).await?;

    println!(
        "sync complete: {} queued for review, {} skipped, {} total",
        outcome.created, outcome.skipped, outcome.total
    );
    Ok(())
}

pub(crate) async fn list_sources(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let sources = dealflow_db::list_sources(pool).await?;
    if sources.is_empty() {
        println!("no sources registered");
        return Ok(());
    }

    for source in &sources {
        let active = if source.is_active { "active" } else { "paused" };
        let last = source
            .last_crawled_at
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        println!(
            "{} {:<30} [{active}] every {}m, last crawled {last}, {} items, {} errors",
            source.public_id,
            source.name,
            source.crawl_interval_minutes,
            source.total_items_crawled,
            source.error_count
        );
    }
    Ok(())
}

pub(crate) async fn add_source(
    pool: &sqlx::PgPool,
    name: String,
    url: String,
    category: String,
    interval: i32,
    priority: i32,
) -> anyhow::Result<()> {
    anyhow::ensure!(interval > 0, "interval must be positive");
    reqwest::Url::parse(&url).map_err(|e| anyhow::anyhow!("invalid feed URL '{url}': {e}"))?;

    let source = dealflow_db::create_source(
        pool,
        &dealflow_db::NewFeedSource {
            name,
            url,
            category,
            crawl_interval_minutes: interval,
            priority,
        },
    )
    .await?;

    println!("registered source {} ({})", source.name, source.public_id);
    Ok(())
}

pub(crate) async fn run_purge(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let purged = dealflow_db::purge_expired_feed_deals(pool).await?;
    println!("purged {purged} expired feed deals");
    Ok(())
}
