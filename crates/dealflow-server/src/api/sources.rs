//! Source registry API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SourceItem {
    id: Uuid,
    name: String,
    url: String,
    category: String,
    is_active: bool,
    crawl_interval_minutes: i32,
    last_crawled_at: Option<DateTime<Utc>>,
    total_items_crawled: i64,
    error_count: i32,
    last_error: Option<String>,
    priority: i32,
    created_at: DateTime<Utc>,
}

impl From<dealflow_db::FeedSourceRow> for SourceItem {
    fn from(row: dealflow_db::FeedSourceRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            url: row.url,
            category: row.category,
            is_active: row.is_active,
            crawl_interval_minutes: row.crawl_interval_minutes,
            last_crawled_at: row.last_crawled_at,
            total_items_crawled: row.total_items_crawled,
            error_count: row.error_count,
            last_error: row.last_error,
            priority: row.priority,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SourceListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateSourceBody {
    name: String,
    url: String,
    category: Option<String>,
    crawl_interval_minutes: Option<i32>,
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateSourceBody {
    name: Option<String>,
    url: Option<String>,
    category: Option<String>,
    is_active: Option<bool>,
    crawl_interval_minutes: Option<i32>,
    priority: Option<i32>,
}

pub(super) async fn list_sources(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SourceListQuery>,
) -> Result<Json<ApiResponse<Vec<SourceItem>>>, ApiError> {
    let rows = if query.active == Some(true) {
        dealflow_db::list_active_sources(&state.pool).await
    } else {
        dealflow_db::list_sources(&state.pool).await
    }
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SourceItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSourceBody>,
) -> Result<(StatusCode, Json<ApiResponse<SourceItem>>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "source name must not be empty",
        ));
    }
    reqwest::Url::parse(&body.url).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid feed URL: {}", body.url),
        )
    })?;
    let interval = body.crawl_interval_minutes.unwrap_or(60);
    if interval <= 0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "crawl_interval_minutes must be positive",
        ));
    }

    let row = dealflow_db::create_source(
        &state.pool,
        &dealflow_db::NewFeedSource {
            name: body.name,
            url: body.url,
            category: body.category.unwrap_or_else(|| "general".to_owned()),
            crawl_interval_minutes: interval,
            priority: body.priority.unwrap_or(0),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SourceItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SourceItem>>, ApiError> {
    let row = dealflow_db::get_source(&state.pool, source_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("source '{source_id}' not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: SourceItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(source_id): Path<Uuid>,
    Json(body): Json<UpdateSourceBody>,
) -> Result<Json<ApiResponse<SourceItem>>, ApiError> {
    if let Some(interval) = body.crawl_interval_minutes {
        if interval <= 0 {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "crawl_interval_minutes must be positive",
            ));
        }
    }
    if let Some(url) = &body.url {
        reqwest::Url::parse(url).map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("invalid feed URL: {url}"),
            )
        })?;
    }

    let row = dealflow_db::update_source(
        &state.pool,
        source_id,
        &dealflow_db::UpdateFeedSource {
            name: body.name,
            url: body.url,
            category: body.category,
            is_active: body.is_active,
            crawl_interval_minutes: body.crawl_interval_minutes,
            priority: body.priority,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    .ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("source '{source_id}' not found"),
        )
    })?;

    Ok(Json(ApiResponse {
        data: SourceItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(source_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = dealflow_db::delete_source(&state.pool, source_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("source '{source_id}' not found"),
        ))
    }
}
