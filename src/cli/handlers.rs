//! CLI command handlers

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::serve_api;
use crate::cli::commands::OutputFormat;
use crate::cli::output::print_analysis;
use crate::cli::output::print_config;
use crate::cli::output::print_search_page;
use crate::config::AppConfig;
use crate::models::SearchRequest;
use crate::pipeline::PipelineContext;
use crate::pipeline::SearchPipeline;
use crate::Result;

pub async fn handle_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    dev: bool,
) -> Result<()> {
    // CLI arguments take priority over config
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.dev_mode |= dev;

    println!("🚀 Starting ShopRank API Server");
    println!("📍 Address: http://{}", config.bind_address());
    println!("🌐 CORS: {}", if config.server.cors { "Enabled" } else { "Disabled" });
    serve_api(&config).await
}

pub struct SearchArgs {
    pub query: String,
    pub category: Option<String>,
    pub price_range: Option<String>,
    pub sort_by: String,
    pub page: usize,
    pub format: OutputFormat,
}

impl SearchArgs {
    fn into_request(self) -> Result<SearchRequest> {
        let mut request = SearchRequest::new(self.query)
            .with_page(self.page)
            .with_sort(self.sort_by.parse()?);
        if let Some(category) = self.category {
            request = request.with_category(category);
        }
        if let Some(range) = self.price_range {
            request = request.with_price_range(range.parse()?);
        }
        Ok(request)
    }
}

pub async fn handle_search(config: &AppConfig, args: SearchArgs) -> Result<()> {
    let format = args.format;
    let request = args.into_request()?;
    let pipeline = SearchPipeline::from_config(config)?;
    let context = PipelineContext::default();

    // Ctrl-C abandons the in-flight search
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let page = pipeline.search(&request, &context, &cancel).await?;
    info!("Search returned {} products", page.products.len());

    match format {
        OutputFormat::Table => print_search_page(&page),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
    }
    Ok(())
}

pub fn handle_analyze(config: &AppConfig, query: &str, category: Option<&str>) -> Result<()> {
    let pipeline = SearchPipeline::from_config(config)?;
    let analysis = pipeline.analyze(query, category)?;
    print_analysis(&analysis);
    Ok(())
}

pub fn handle_config(config: &AppConfig) -> Result<()> {
    print_config(config);
    Ok(())
}
