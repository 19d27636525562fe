//! Public deal listings: the published feed and raw feed-crawled deals.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct PublishedItem {
    id: Uuid,
    title: String,
    price: Decimal,
    original_price: Decimal,
    discount_percent: Decimal,
    image_url: Option<String>,
    link: String,
    category: String,
    is_hot: bool,
    is_featured: bool,
    coupon_code: Option<String>,
    promo_text: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<dealflow_db::PublishedDealRow> for PublishedItem {
    fn from(row: dealflow_db::PublishedDealRow) -> Self {
        Self {
            id: row.public_id,
            title: row.title,
            price: row.price,
            original_price: row.original_price,
            discount_percent: row.discount_percent,
            image_url: row.image_url,
            link: row.link,
            category: row.category,
            is_hot: row.is_hot,
            is_featured: row.is_featured,
            coupon_code: row.coupon_code,
            promo_text: row.promo_text,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct FeedDealItem {
    guid: String,
    title: String,
    description: String,
    link: String,
    image_url: Option<String>,
    category: String,
    price: Option<Decimal>,
    original_price: Option<Decimal>,
    discount_percent: Option<Decimal>,
    store_name: Option<String>,
    coupon_code: Option<String>,
    published_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<dealflow_db::FeedDealRow> for FeedDealItem {
    fn from(row: dealflow_db::FeedDealRow) -> Self {
        Self {
            guid: row.guid,
            title: row.title,
            description: row.description,
            link: row.link,
            image_url: row.image_url,
            category: row.category,
            price: row.price,
            original_price: row.original_price,
            discount_percent: row.discount_percent,
            store_name: row.store_name,
            coupon_code: row.coupon_code,
            published_at: row.published_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PublishedQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FeedDealQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(super) async fn list_published(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PublishedQuery>,
) -> Result<Json<ApiResponse<Vec<PublishedItem>>>, ApiError> {
    let rows = dealflow_db::list_published_deals(
        &state.pool,
        query.category.as_deref(),
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PublishedItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_feed_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FeedDealQuery>,
) -> Result<Json<ApiResponse<Vec<FeedDealItem>>>, ApiError> {
    let rows = dealflow_db::list_active_feed_deals(
        &state.pool,
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(FeedDealItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
