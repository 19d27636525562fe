//! Moderation of the pending-deal queue.
//!
//! Approval runs in a single transaction holding a row lock on the queue
//! entry, so two moderators racing on the same deal serialize: the first
//! wins, the second sees a conflict. The published-deal event fires only
//! after the commit succeeds.

use sqlx::PgPool;

use dealflow_core::money::discount_percent;
use dealflow_db::{
    insert_published_deal, list_pending_deals, lock_pending_deal, mark_pending_approved,
    mark_pending_rejected, DbError, NewPublishedDeal, PendingDealRow, PendingStatus,
    PublishedDealRow,
};

use crate::affiliate::AffiliateTagger;
use crate::error::IngestError;
use crate::events::{EventBus, PublishedEvent};

/// Moderator-supplied edits applied at approval time.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ApprovalOverrides {
    pub custom_title: Option<String>,
    pub is_hot: Option<bool>,
    pub is_featured: Option<bool>,
    pub coupon_code: Option<String>,
    pub promo_text: Option<String>,
}

/// Approves a pending deal: publishes it, flips its status, and emits a
/// [`PublishedEvent`].
///
/// The discount is recomputed from the stored price pair rather than
/// trusting the queued value. Affiliate tagging is best effort and never
/// blocks approval.
///
/// # Errors
///
/// - [`IngestError::NotFound`] if no queue entry has this id.
/// - [`IngestError::Conflict`] if the entry was already reviewed.
/// - [`IngestError::Db`] on any database failure.
pub async fn approve(
    pool: &PgPool,
    tagger: &AffiliateTagger,
    bus: &EventBus,
    pending_id: i64,
    moderator: &str,
    overrides: ApprovalOverrides,
) -> Result<PublishedDealRow, IngestError> {
    let mut tx = pool.begin().await.map_err(DbError::from)?;

    let pending = lock_pending_deal(&mut tx, pending_id)
        .await
        .map_err(map_lock_error)?;
    ensure_still_pending(&pending)?;

    let link = tagger.tag_url(&pending.product_url);
    let title = overrides
        .custom_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| pending.title.clone());

    let published = insert_published_deal(
        &mut tx,
        &NewPublishedDeal {
            title,
            price: pending.price,
            original_price: pending.original_price,
            discount_percent: discount_percent(pending.price, pending.original_price),
            image_url: pending.image_url.clone(),
            link,
            category: pending.category.clone(),
            is_hot: overrides.is_hot.unwrap_or(false),
            is_featured: overrides.is_featured.unwrap_or(false),
            coupon_code: overrides.coupon_code.filter(|c| !c.trim().is_empty()),
            promo_text: overrides.promo_text.filter(|p| !p.trim().is_empty()),
            pending_deal_id: Some(pending.id),
            asin: Some(pending.asin.clone()),
        },
    )
    .await?;

    mark_pending_approved(&mut tx, pending_id, moderator).await?;
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(
        pending_id,
        deal_id = %published.public_id,
        moderator,
        "deal approved and published"
    );
    bus.publish(PublishedEvent {
        id: published.public_id,
        title: published.title.clone(),
        price: published.price,
        discount_percent: published.discount_percent,
        image_url: published.image_url.clone(),
    });
    Ok(published)
}

/// Rejects a pending deal with a mandatory reason.
///
/// The reason is validated before any database work so an empty submission
/// never takes the row lock.
///
/// # Errors
///
/// - [`IngestError::Validation`] if `reason` is blank.
/// - [`IngestError::NotFound`] if no queue entry has this id.
/// - [`IngestError::Conflict`] if the entry was already reviewed.
/// - [`IngestError::Db`] on any database failure.
pub async fn reject(
    pool: &PgPool,
    pending_id: i64,
    moderator: &str,
    reason: &str,
) -> Result<(), IngestError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(IngestError::Validation(
            "rejection reason must not be empty".to_owned(),
        ));
    }

    let mut tx = pool.begin().await.map_err(DbError::from)?;
    let pending = lock_pending_deal(&mut tx, pending_id)
        .await
        .map_err(map_lock_error)?;
    ensure_still_pending(&pending)?;

    mark_pending_rejected(&mut tx, pending_id, moderator, reason).await?;
    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(pending_id, moderator, "deal rejected");
    Ok(())
}

/// Lists queue entries for the review UI.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if the query fails.
pub async fn list_pending(
    pool: &PgPool,
    status: Option<PendingStatus>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PendingDealRow>, IngestError> {
    let rows = list_pending_deals(pool, status, category, limit, offset).await?;
    Ok(rows)
}

fn map_lock_error(e: DbError) -> IngestError {
    match e {
        DbError::NotFound => IngestError::NotFound,
        other => IngestError::Db(other),
    }
}

fn ensure_still_pending(pending: &PendingDealRow) -> Result<(), IngestError> {
    if pending.status == PendingStatus::Pending.as_str() {
        Ok(())
    } else {
        Err(IngestError::Conflict(format!(
            "deal {} is already {}",
            pending.id, pending.status
        )))
    }
}
