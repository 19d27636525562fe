//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring crawl tick and the expired-deal purge.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    http: reqwest::Client,
    config: Arc<dealflow_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_crawl_tick(&scheduler, pool.clone(), http, config).await?;
    register_purge_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the crawl tick, every five minutes (`0 */5 * * * *`).
///
/// Each tick crawls whichever sources are due per their own interval. The
/// tick cadence only bounds scheduling granularity; a source with a
/// 30-minute interval is still crawled roughly every 30 minutes.
async fn register_crawl_tick(
    scheduler: &JobScheduler,
    pool: PgPool,
    http: reqwest::Client,
    config: Arc<dealflow_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let http = http.clone();
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::debug!("scheduler: crawl tick");
            match dealflow_ingest::crawl_due_sources(&pool, &http, config.crawl_concurrency).await {
                Ok(reports) if reports.is_empty() => {}
                Ok(reports) => {
                    let new_items: usize = reports.iter().map(|r| r.new_items).sum();
                    tracing::info!(
                        sources = reports.len(),
                        new_items,
                        "scheduler: crawl tick complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: crawl tick failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered crawl tick (every 5 minutes)");
    Ok(())
}

/// Register the hourly purge of expired feed deals (`0 0 * * * *`).
async fn register_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match dealflow_db::purge_expired_feed_deals(&pool).await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::info!(purged, "scheduler: purged expired feed deals");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: purge failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered hourly expired-deal purge");
    Ok(())
}
