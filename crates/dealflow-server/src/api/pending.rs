//! Moderation queue handlers.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealflow_db::PendingStatus;
use dealflow_ingest::ApprovalOverrides;

use crate::middleware::RequestId;

use super::{
    deals::PublishedItem, map_ingest_error, normalize_limit, normalize_offset, ApiError,
    ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct PendingItem {
    id: i64,
    asin: String,
    title: String,
    description: Option<String>,
    price: Decimal,
    original_price: Decimal,
    discount_percent: Decimal,
    image_url: Option<String>,
    product_url: String,
    category: String,
    status: String,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<dealflow_db::PendingDealRow> for PendingItem {
    fn from(row: dealflow_db::PendingDealRow) -> Self {
        Self {
            id: row.id,
            asin: row.asin,
            title: row.title,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            discount_percent: row.discount_percent,
            image_url: row.image_url,
            product_url: row.product_url,
            category: row.category,
            status: row.status,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PendingQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApproveBody {
    moderator: String,
    #[serde(flatten)]
    overrides: ApprovalOverrides,
}

#[derive(Debug, Deserialize)]
pub(super) struct RejectBody {
    moderator: String,
    reason: String,
}

pub(super) async fn list_pending(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<PendingItem>>>, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(PendingStatus::parse(raw).ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown status '{raw}'"),
            )
        })?),
    };

    let rows = dealflow_ingest::list_pending(
        &state.pool,
        status,
        query.category.as_deref(),
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PendingItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn approve_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(pending_id): Path<i64>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<ApiResponse<PublishedItem>>, ApiError> {
    if body.moderator.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "moderator must not be empty",
        ));
    }

    let published = dealflow_ingest::approve(
        &state.pool,
        &state.tagger,
        &state.bus,
        pending_id,
        &body.moderator,
        body.overrides,
    )
    .await
    .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PublishedItem::from(published),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reject_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(pending_id): Path<i64>,
    Json(body): Json<RejectBody>,
) -> Result<Json<ApiResponse<PendingItem>>, ApiError> {
    if body.moderator.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "moderator must not be empty",
        ));
    }

    dealflow_ingest::reject(&state.pool, pending_id, &body.moderator, &body.reason)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    let row = dealflow_db::get_pending_deal(&state.pool, pending_id)
        .await
        .map_err(|e| super::map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: PendingItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
