//! Database operations for the `pending_deals` moderation queue.
//!
//! Moderation transitions run inside a caller-owned transaction so that the
//! row lock taken by [`lock_pending_deal`] covers the status check, the
//! publish insert, and the status flip as one unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Review state of a pending deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
}

impl PendingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `pending_deals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingDealRow {
    pub id: i64,
    pub asin: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub product_url: String,
    pub category: String,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for queueing one catalog-sourced candidate for review.
#[derive(Debug, Clone)]
pub struct NewPendingDeal {
    pub asin: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Decimal,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub product_url: String,
    pub category: String,
}

const PENDING_COLUMNS: &str = "id, asin, title, description, price, original_price, \
     discount_percent, image_url, product_url, category, status, reviewed_by, \
     reviewed_at, rejection_reason, created_at";

/// Inserts a candidate unless its `asin` already exists in the queue.
///
/// Returns `true` when a row was created. An asin that was previously
/// rejected stays rejected; re-syncing never resurrects it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_pending_deal_if_new(
    pool: &PgPool,
    deal: &NewPendingDeal,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO pending_deals \
           (asin, title, description, price, original_price, discount_percent, \
            image_url, product_url, category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (asin) DO NOTHING",
    )
    .bind(&deal.asin)
    .bind(&deal.title)
    .bind(deal.description.as_deref())
    .bind(deal.price)
    .bind(deal.original_price)
    .bind(deal.discount_percent)
    .bind(deal.image_url.as_deref())
    .bind(&deal.product_url)
    .bind(&deal.category)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns a single pending deal by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_pending_deal(pool: &PgPool, id: i64) -> Result<Option<PendingDealRow>, DbError> {
    let row = sqlx::query_as::<_, PendingDealRow>(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_deals WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Lists queue entries, optionally filtered by status and category,
/// newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pending_deals(
    pool: &PgPool,
    status: Option<PendingStatus>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PendingDealRow>, DbError> {
    let rows = sqlx::query_as::<_, PendingDealRow>(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_deals \
         WHERE ($1::TEXT IS NULL OR status = $1) \
           AND ($2::TEXT IS NULL OR category = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(status.map(PendingStatus::as_str))
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetches a queue entry with `FOR UPDATE`, blocking concurrent moderators
/// until the surrounding transaction commits or rolls back.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn lock_pending_deal(
    conn: &mut PgConnection,
    id: i64,
) -> Result<PendingDealRow, DbError> {
    let row = sqlx::query_as::<_, PendingDealRow>(&format!(
        "SELECT {PENDING_COLUMNS} FROM pending_deals WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Flips a locked queue entry to `approved` and records the moderator.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_pending_approved(
    conn: &mut PgConnection,
    id: i64,
    reviewed_by: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE pending_deals \
         SET status = 'approved', reviewed_by = $2, reviewed_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(reviewed_by)
    .execute(conn)
    .await?;
    Ok(())
}

/// Flips a locked queue entry to `rejected`, recording moderator and reason.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_pending_rejected(
    conn: &mut PgConnection,
    id: i64,
    reviewed_by: &str,
    reason: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE pending_deals \
         SET status = 'rejected', reviewed_by = $2, reviewed_at = NOW(), \
             rejection_reason = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(reviewed_by)
    .bind(reason)
    .execute(conn)
    .await?;
    Ok(())
}
