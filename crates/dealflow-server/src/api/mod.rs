mod crawl;
mod deals;
mod pending;
mod sources;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use dealflow_catalog::CatalogClient;
use dealflow_ingest::{AffiliateTagger, EventBus, IngestError};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub http: reqwest::Client,
    pub catalog: Arc<CatalogClient>,
    pub tagger: AffiliateTagger,
    pub bus: EventBus,
    pub crawl_concurrency: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

pub(super) fn map_db_error(request_id: String, error: &dealflow_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_ingest_error(request_id: String, error: &IngestError) -> ApiError {
    match error {
        IngestError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        IngestError::Conflict(message) => ApiError::new(request_id, "conflict", message.clone()),
        IngestError::Validation(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        IngestError::Catalog(e) => {
            tracing::error!(error = %e, "catalog request failed");
            ApiError::new(request_id, "upstream_error", "catalog request failed")
        }
        IngestError::Feed(e) => {
            tracing::error!(error = %e, "feed request failed");
            ApiError::new(request_id, "upstream_error", "feed request failed")
        }
        IngestError::Db(e) => map_db_error(request_id, e),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/sources",
            get(sources::list_sources).post(sources::create_source),
        )
        .route(
            "/api/v1/sources/{source_id}",
            get(sources::get_source)
                .patch(sources::update_source)
                .delete(sources::delete_source),
        )
        .route("/api/v1/crawl", post(crawl::trigger_crawl))
        .route("/api/v1/sync", post(crawl::trigger_sync))
        .route("/api/v1/pending", get(pending::list_pending))
        .route(
            "/api/v1/pending/{pending_id}/approve",
            post(pending::approve_deal),
        )
        .route(
            "/api/v1/pending/{pending_id}/reject",
            post(pending::reject_deal),
        )
        .route("/api/v1/deals", get(deals::list_published))
        .route("/api/v1/feed-deals", get(deals::list_feed_deals))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match dealflow_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state(pool: PgPool) -> AppState {
        let catalog = CatalogClient::with_base_url(
            None,
            5,
            "dealflow-test/0.1",
            Duration::from_millis(0),
            "http://127.0.0.1:1",
        )
        .expect("catalog client");
        AppState {
            pool,
            http: reqwest::Client::new(),
            catalog: Arc::new(catalog),
            tagger: AffiliateTagger::new("dealflow-20"),
            bus: EventBus::new(),
            crawl_concurrency: 2,
        }
    }

    fn test_app(pool: PgPool) -> Router {
        let auth = AuthState::from_env(true).expect("auth");
        build_app(test_state(pool), auth)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn normalize_limit_clamps_to_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(5000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("conflict", StatusCode::CONFLICT),
            ("upstream_error", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), expected, "code {code}");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_returns_ok_with_live_database(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_then_list_sources(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let create = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sources")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "name": "Slickdeals",
                            "url": "https://slickdeals.net/newsearch.php?rss=1",
                            "category": "general",
                            "crawl_interval_minutes": 30
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(create.status(), StatusCode::CREATED);
        let created = body_json(create).await;
        assert_eq!(created["data"]["name"], "Slickdeals");
        assert!(created["data"]["id"].is_string(), "public id is a uuid");

        let list = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/sources")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(list.status(), StatusCode::OK);
        let listed = body_json(list).await;
        assert_eq!(listed["data"].as_array().expect("array").len(), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unknown_source_is_404(pool: sqlx::PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/sources/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn sync_endpoint_queues_mock_deals(pool: sqlx::PgPool) {
        let response = test_app(pool.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sync")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"keywords": "earbuds", "item_count": 4}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["created"], 4);
        assert_eq!(json["data"]["total"], 4);

        let pending = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pending?status=pending")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let listed = body_json(pending).await;
        assert_eq!(listed["data"].as_array().expect("array").len(), 4);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn reject_without_reason_is_validation_error(pool: sqlx::PgPool) {
        // Seed one pending deal through the sync endpoint.
        let app = test_app(pool);
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sync")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"keywords": "desk", "item_count": 1}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        let pending = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pending")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let listed = body_json(pending).await;
        let id = listed["data"][0]["id"].as_i64().expect("id");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/pending/{id}/reject"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"moderator": "mod-alice", "reason": "  "}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn approve_endpoint_publishes_deal(pool: sqlx::PgPool) {
        let app = test_app(pool);
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sync")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"keywords": "camera", "item_count": 1}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        let pending = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/pending")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let listed = body_json(pending).await;
        let id = listed["data"][0]["id"].as_i64().expect("id");

        let approve = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/pending/{id}/approve"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"moderator": "mod-alice", "is_hot": true}).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(approve.status(), StatusCode::OK);
        let approved = body_json(approve).await;
        assert_eq!(approved["data"]["is_hot"], true);

        let deals = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/deals")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let live = body_json(deals).await;
        assert_eq!(live["data"].as_array().expect("array").len(), 1);
    }
}
