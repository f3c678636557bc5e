//! HTTP server implementation

use std::time::Duration;

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::cache::SearchCache;
use crate::config::AppConfig;
use crate::pipeline::PipelineContext;
use crate::pipeline::SearchPipeline;
use crate::Result;

/// Period of the expired-entry sweep
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Full application router with middleware
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let api = routes::api_routes(state);
    let mut app = Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests.max(1)));

    if config.server.cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    app
}

/// Start the API server
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("Starting ShopRank API server...");

    let pipeline = SearchPipeline::from_config(config)?;
    let cache = SearchCache::with_config(config.cache.to_cache_config());
    let state = AppState::new(pipeline, PipelineContext::new(cache.clone()), config.server.dev_mode);
    let app = build_router(state, config);

    if config.cache.enabled {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                cache.cleanup_expired().await;
            }
        });
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints (also under /api):");
    info!("  GET /health");
    info!("  GET /search?query=&category=&priceRange=&sortBy=&page=");
    info!("  GET /search/suggestions?query=");
    info!("  GET /search/trending");
    info!("  GET /stats");
    if config.server.dev_mode {
        info!("Development mode: error details are included in responses");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
