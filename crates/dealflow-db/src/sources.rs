//! Database operations for the `feed_sources` table (the source registry).
//!
//! Scheduling metadata (last-crawl time, counters, last error) is owned here
//! and mutated only through [`mark_crawl_success`] / [`mark_crawl_failure`];
//! there is no ambient scheduling state anywhere else in the workspace.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `feed_sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedSourceRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub url: String,
    pub category: String,
    pub is_active: bool,
    pub crawl_interval_minutes: i32,
    /// `None` means never crawled; such a source is always due.
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub total_items_crawled: i64,
    pub error_count: i32,
    pub last_error: Option<String>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for registering a new feed source.
#[derive(Debug, Clone)]
pub struct NewFeedSource {
    pub name: String,
    pub url: String,
    pub category: String,
    pub crawl_interval_minutes: i32,
    pub priority: i32,
}

/// Partial update for a feed source; `None` preserves the existing value.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeedSource {
    pub name: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub crawl_interval_minutes: Option<i32>,
    pub priority: Option<i32>,
}

const SOURCE_COLUMNS: &str = "id, public_id, name, url, category, is_active, \
     crawl_interval_minutes, last_crawled_at, total_items_crawled, error_count, \
     last_error, priority, created_at, updated_at";

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Registers a new feed source and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_source(pool: &PgPool, source: &NewFeedSource) -> Result<FeedSourceRow, DbError> {
    let row = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "INSERT INTO feed_sources (name, url, category, crawl_interval_minutes, priority) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {SOURCE_COLUMNS}"
    ))
    .bind(&source.name)
    .bind(&source.url)
    .bind(&source.category)
    .bind(source.crawl_interval_minutes)
    .bind(source.priority)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a single source by public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_source(pool: &PgPool, public_id: Uuid) -> Result<Option<FeedSourceRow>, DbError> {
    let row = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM feed_sources WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns all sources, highest priority first, name as tie-break.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sources(pool: &PgPool) -> Result<Vec<FeedSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM feed_sources ORDER BY priority DESC, name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns all active sources, highest priority first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_sources(pool: &PgPool) -> Result<Vec<FeedSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM feed_sources \
         WHERE is_active = true \
         ORDER BY priority DESC, name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the active sources that are due for a crawl.
///
/// Due-ness is computed against each source's own interval, never a global
/// one: never-crawled sources (`last_crawled_at IS NULL`) are always due.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_sources(pool: &PgPool) -> Result<Vec<FeedSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM feed_sources \
         WHERE is_active = true \
           AND (last_crawled_at IS NULL \
                OR NOW() >= last_crawled_at + make_interval(mins => crawl_interval_minutes)) \
         ORDER BY priority DESC, name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Applies a partial update and returns the updated row, or `None` if the
/// source does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_source(
    pool: &PgPool,
    public_id: Uuid,
    update: &UpdateFeedSource,
) -> Result<Option<FeedSourceRow>, DbError> {
    let row = sqlx::query_as::<_, FeedSourceRow>(&format!(
        "UPDATE feed_sources \
         SET name                   = COALESCE($2, name), \
             url                    = COALESCE($3, url), \
             category               = COALESCE($4, category), \
             is_active              = COALESCE($5, is_active), \
             crawl_interval_minutes = COALESCE($6, crawl_interval_minutes), \
             priority               = COALESCE($7, priority), \
             updated_at             = NOW() \
         WHERE public_id = $1 \
         RETURNING {SOURCE_COLUMNS}"
    ))
    .bind(public_id)
    .bind(update.name.as_deref())
    .bind(update.url.as_deref())
    .bind(update.category.as_deref())
    .bind(update.is_active)
    .bind(update.crawl_interval_minutes)
    .bind(update.priority)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a source. The pipeline never calls this; it exists for the
/// external admin surface only. Feed deals cascade.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_source(pool: &PgPool, public_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM feed_sources WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Scheduler bookkeeping
// ---------------------------------------------------------------------------

/// Records a completed crawl attempt that reached the feed.
///
/// Sets `last_crawled_at = NOW()` and adds `new_items` to the cumulative
/// counter. When `entry_errors` is `None` the error counter resets; when
/// some entries failed it increments and the message is kept, without
/// blocking the next scheduled crawl.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_crawl_success(
    pool: &PgPool,
    source_id: i64,
    new_items: i64,
    entry_errors: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE feed_sources \
         SET last_crawled_at     = NOW(), \
             total_items_crawled = total_items_crawled + $2, \
             error_count         = CASE WHEN $3::TEXT IS NULL THEN 0 ELSE error_count + 1 END, \
             last_error          = $3, \
             updated_at          = NOW() \
         WHERE id = $1",
    )
    .bind(source_id)
    .bind(new_items)
    .bind(entry_errors)
    .execute(pool)
    .await?;
    Ok(())
}

/// Records a crawl attempt that failed before any entry was processed
/// (network, DNS, non-2xx).
///
/// `last_crawled_at` is deliberately left untouched: the source remains due
/// and retries on the next tick instead of being pushed back a full
/// interval.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_crawl_failure(pool: &PgPool, source_id: i64, error: &str) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE feed_sources \
         SET error_count = error_count + 1, \
             last_error  = $2, \
             updated_at  = NOW() \
         WHERE id = $1",
    )
    .bind(source_id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}
