//! Manual crawl and catalog sync handlers.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use dealflow_catalog::SearchParams;
use dealflow_ingest::{crawl_on_demand, sync_catalog_deals, CrawlReport, SyncOutcome};

use crate::middleware::RequestId;

use super::{map_ingest_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct CrawlBody {
    /// Crawl only this source; omitted means every active source.
    pub source_id: Option<Uuid>,
}

/// `POST /api/v1/crawl` runs a crawl immediately, outside the schedule.
pub(super) async fn trigger_crawl(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<CrawlBody>>,
) -> Result<Json<ApiResponse<Vec<CrawlReport>>>, ApiError> {
    let source_id = body.and_then(|Json(b)| b.source_id);
    let reports = crawl_on_demand(&state.pool, &state.http, state.crawl_concurrency, source_id)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: reports,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `POST /api/v1/sync` searches the catalog and queues results for review.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<SearchParams>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    let outcome = sync_catalog_deals(&state.pool, &state.catalog, &params)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}
