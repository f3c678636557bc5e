//! API request handlers

use std::sync::Arc;

use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::api::types::SearchParams;
use crate::api::types::StatsResponse;
use crate::api::types::SuggestionParams;
use crate::api::types::SuggestionsResponse;
use crate::api::types::TrendingResponse;
use crate::errors::ShopRankError;
use crate::models::SearchResultPage;
use crate::pipeline::suggest;
use crate::pipeline::PipelineContext;
use crate::pipeline::SearchPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
    pub context: Arc<PipelineContext>,
    /// Include error detail in failure responses
    pub dev_mode: bool,
}

impl AppState {
    pub fn new(pipeline: SearchPipeline, context: PipelineContext, dev_mode: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            context: Arc::new(context),
            dev_mode,
        }
    }
}

/// Error leaving a handler: stable public message, detail only in dev mode
pub struct ApiError {
    error: ShopRankError,
    dev_mode: bool,
}

impl ApiError {
    fn new(error: ShopRankError, dev_mode: bool) -> Self {
        Self { error, dev_mode }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed: {}", self.error);
        } else {
            warn!("Request rejected: {}", self.error);
        }
        let detail = self.dev_mode.then(|| self.error.to_string());
        let body: ApiResponse<()> = ApiResponse::error(self.error.public_message(), detail);
        (status, Json(body)).into_response()
    }
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /search`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchResultPage>>, ApiError> {
    let request = params
        .into_request()
        .map_err(|e| ApiError::new(e, state.dev_mode))?;
    info!("GET /search query='{}' page={}", request.query, request.page);

    // Dropping the handler (client gone) cancels the pipeline run
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let page = state
        .pipeline
        .search(&request, &state.context, &cancel)
        .await
        .map_err(|e| ApiError::new(e, state.dev_mode))?;
    Ok(Json(ApiResponse::success(page)))
}

/// `GET /search/suggestions`
pub async fn suggestions(Query(params): Query<SuggestionParams>) -> Json<ApiResponse<SuggestionsResponse>> {
    let query = params.query.unwrap_or_default();
    Json(ApiResponse::success(SuggestionsResponse {
        suggestions: suggest::suggestions(&query),
    }))
}

/// `GET /search/trending`
pub async fn trending() -> Json<ApiResponse<TrendingResponse>> {
    Json(ApiResponse::success(TrendingResponse {
        trending: suggest::trending(),
    }))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let cache = state.context.cache.stats().await;
    let providers = state.context.stats.read().await.snapshot();
    Json(ApiResponse::success(StatsResponse {
        cache_entries: state.context.cache.len().await,
        cache_hit_rate: cache.hit_rate(),
        cache,
        providers,
    }))
}
