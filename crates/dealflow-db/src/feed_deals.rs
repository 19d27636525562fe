//! Database operations for the `feed_deals` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `feed_deals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedDealRow {
    pub id: i64,
    pub guid: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_url: Option<String>,
    pub category: String,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub store_name: Option<String>,
    pub coupon_code: Option<String>,
    pub published_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_hot: bool,
    pub is_featured: bool,
    pub source_id: i64,
    pub is_active: bool,
    pub view_count: i64,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for persisting one feed-sourced candidate.
#[derive(Debug, Clone)]
pub struct NewFeedDeal {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_url: Option<String>,
    pub category: String,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub store_name: Option<String>,
    pub coupon_code: Option<String>,
    pub published_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub source_id: i64,
}

/// Inserts a candidate unless its `guid` already exists.
///
/// Returns `true` when a row was created, `false` when the unique index on
/// `guid` swallowed the insert. The index guarantees at-most-one row per
/// guid under concurrent crawls.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_feed_deal_if_new(pool: &PgPool, deal: &NewFeedDeal) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO feed_deals \
           (guid, title, description, link, image_url, category, price, original_price, \
            discount_percent, store_name, coupon_code, published_at, expires_at, source_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (guid) DO NOTHING",
    )
    .bind(&deal.guid)
    .bind(&deal.title)
    .bind(&deal.description)
    .bind(&deal.link)
    .bind(deal.image_url.as_deref())
    .bind(&deal.category)
    .bind(deal.price)
    .bind(deal.original_price)
    .bind(deal.discount_percent)
    .bind(deal.store_name.as_deref())
    .bind(deal.coupon_code.as_deref())
    .bind(deal.published_at)
    .bind(deal.expires_at)
    .bind(deal.source_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns active feed deals, newest first, paginated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_feed_deals(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedDealRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedDealRow>(
        "SELECT id, guid, title, description, link, image_url, category, price, \
                original_price, discount_percent, store_name, coupon_code, published_at, \
                expires_at, is_hot, is_featured, source_id, is_active, view_count, \
                click_count, created_at \
         FROM feed_deals \
         WHERE is_active = true \
         ORDER BY published_at DESC, id DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes feed deals whose expiry has passed; returns the count removed.
///
/// Runs on its own schedule, decoupled from crawling.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn purge_expired_feed_deals(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM feed_deals WHERE expires_at IS NOT NULL AND expires_at < NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
