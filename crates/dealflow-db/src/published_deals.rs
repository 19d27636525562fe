//! Database operations for the `published_deals` table (the live site feed).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use dealflow_core::money::discount_percent;

use crate::DbError;

/// A row from the `published_deals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublishedDealRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub link: String,
    pub category: String,
    pub is_hot: bool,
    pub is_featured: bool,
    pub coupon_code: Option<String>,
    pub promo_text: Option<String>,
    pub pending_deal_id: Option<i64>,
    pub asin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for publishing one approved deal.
#[derive(Debug, Clone)]
pub struct NewPublishedDeal {
    pub title: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub link: String,
    pub category: String,
    pub is_hot: bool,
    pub is_featured: bool,
    pub coupon_code: Option<String>,
    pub promo_text: Option<String>,
    pub pending_deal_id: Option<i64>,
    pub asin: Option<String>,
}

const PUBLISHED_COLUMNS: &str = "id, public_id, title, price, original_price, \
     discount_percent, image_url, link, category, is_hot, is_featured, \
     coupon_code, promo_text, pending_deal_id, asin, created_at, updated_at";

/// Inserts a published deal and returns the full row.
///
/// Takes a connection rather than a pool so the approval flow can run it
/// inside the same transaction that holds the queue-entry lock.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_published_deal(
    conn: &mut PgConnection,
    deal: &NewPublishedDeal,
) -> Result<PublishedDealRow, DbError> {
    let row = sqlx::query_as::<_, PublishedDealRow>(&format!(
        "INSERT INTO published_deals \
           (title, price, original_price, discount_percent, image_url, link, \
            category, is_hot, is_featured, coupon_code, promo_text, \
            pending_deal_id, asin) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {PUBLISHED_COLUMNS}"
    ))
    .bind(&deal.title)
    .bind(deal.price)
    .bind(deal.original_price)
    .bind(deal.discount_percent)
    .bind(deal.image_url.as_deref())
    .bind(&deal.link)
    .bind(&deal.category)
    .bind(deal.is_hot)
    .bind(deal.is_featured)
    .bind(deal.coupon_code.as_deref())
    .bind(deal.promo_text.as_deref())
    .bind(deal.pending_deal_id)
    .bind(deal.asin.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Lists published deals, optionally filtered by category, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_published_deals(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PublishedDealRow>, DbError> {
    let rows = sqlx::query_as::<_, PublishedDealRow>(&format!(
        "SELECT {PUBLISHED_COLUMNS} FROM published_deals \
         WHERE ($1::TEXT IS NULL OR category = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Updates a published deal's price pair and recomputes its discount.
///
/// Returns the updated row, or `None` if the deal does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_published_prices(
    pool: &PgPool,
    public_id: Uuid,
    price: Decimal,
    original_price: Decimal,
) -> Result<Option<PublishedDealRow>, DbError> {
    let discount = discount_percent(price, original_price);
    let row = sqlx::query_as::<_, PublishedDealRow>(&format!(
        "UPDATE published_deals \
         SET price = $2, original_price = $3, discount_percent = $4, \
             updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING {PUBLISHED_COLUMNS}"
    ))
    .bind(public_id)
    .bind(price)
    .bind(original_price)
    .bind(discount)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
