//! End-to-end pipeline tests against in-memory catalogues

use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use shoprank::api::build_router;
use shoprank::api::handlers::AppState;
use shoprank::errors::ProviderError;
use shoprank::errors::ProviderErrorKind;
use shoprank::filter::dedup_key;
use shoprank::models::Category;
use shoprank::models::SearchRequest;
use shoprank::models::SortBy;
use shoprank::models::SourceTier;
use shoprank::pipeline::PipelineSettings;
use shoprank::retrieval::providers::StaticCatalogProvider;
use shoprank::retrieval::ProviderOptions;
use shoprank::retrieval::RawProviderResult;
use shoprank::retrieval::RetrievalOptions;
use shoprank::retrieval::SearchProvider;
use shoprank::retrieval::Source;
use shoprank::retrieval::SourceRetriever;
use shoprank::AppConfig;
use shoprank::PipelineContext;
use shoprank::Result;
use shoprank::SearchPipeline;
use shoprank::ShopRankError;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SHARED_GTIN: &str = "8801643711013";

fn listing(title: &str, link: &str, snippet: &str, price: &str, reviews: u64) -> RawProviderResult {
    RawProviderResult {
        price: Some(price.to_string()),
        rating: Some(4.4),
        review_count: Some(reviews),
        availability: Some("InStock".to_string()),
        ..RawProviderResult::new(title, link, snippet)
    }
}

fn test_listings() -> Vec<RawProviderResult> {
    vec![
        RawProviderResult {
            product_id: Some(SHARED_GTIN.to_string()),
            ..listing(
                "Samsung Galaxy S25 Ultra 5G (Titanium Black, 256 GB)",
                "https://www.flipkart.com/samsung-galaxy-s25-ultra-5g/p/itm0001",
                "Smartphone with 200 MP camera. Buy now.",
                "129999",
                2100,
            )
        },
        RawProviderResult {
            product_id: Some(SHARED_GTIN.to_string()),
            ..listing(
                "Samsung Galaxy S25 Ultra 5G (Titanium Black, 256 GB)",
                "https://www.croma.com/samsung-galaxy-s25-ultra-5g/p/300001",
                "Smartphone with 200 MP camera. Order now.",
                "₹1,28,999",
                150,
            )
        },
        listing(
            "Samsung Galaxy S25 5G (Navy, 128 GB)",
            "https://www.amazon.in/Samsung-Galaxy-Navy-128GB/dp/B0DSKL9MQ8",
            "Galaxy AI smartphone. Add to cart.",
            "₹80,999",
            812,
        ),
        listing(
            "Samsung Galaxy S25+ 5G (Icyblue, 256 GB)",
            "https://www.croma.com/samsung-galaxy-s25-plus-5g/p/310545",
            "Smartphone with 6.7 inch display. Order now.",
            "99999",
            164,
        ),
        listing(
            "Samsung Galaxy S25 Edge 5G (Silver, 256 GB)",
            "https://www.reliancedigital.in/samsung-galaxy-s25-edge-5g/p/494422999",
            "Slim smartphone with 200 MP camera. Buy online.",
            "₹1,09,999",
            48,
        ),
        listing(
            "Samsung 7 kg 5 Star Ecobubble Front Load Washing Machine",
            "https://www.flipkart.com/samsung-7-kg-front-load-washing-machine/p/itm0002",
            "Washing machine with hygiene steam. Buy now.",
            "31990",
            8900,
        ),
        listing(
            "LG 8 kg 5 Star Inverter Front Load Washing Machine",
            "https://www.amazon.in/LG-Inverter-Front-Load-Washing/dp/B08SR372S7",
            "Washing machine with steam wash. Buy now, in stock.",
            "₹36,990",
            15230,
        ),
        RawProviderResult::new(
            "Best phones 2024 discussion",
            "https://www.reddit.com/r/india/comments/18x2k1/best_phones_2024_discussion/",
            "Galaxy S25 vs iPhone 15 thread",
        ),
    ]
}

/// Primary marketplaces, secondary retailers and an unrestricted tertiary source
fn tiered_sources(provider: Arc<dyn SearchProvider>) -> Vec<Source> {
    vec![
        Source::new("marketplaces", SourceTier::Primary, provider.clone())
            .with_sites(vec!["flipkart.com".to_string(), "amazon.in".to_string()])
            .with_priority(0),
        Source::new("retailers", SourceTier::Secondary, provider.clone())
            .with_sites(vec!["croma.com".to_string(), "reliancedigital.in".to_string()])
            .with_priority(1),
        Source::new("open-web", SourceTier::Tertiary, provider).with_priority(2),
    ]
}

/// Every tier runs regardless of how many candidates arrive early
fn exhaustive_options() -> RetrievalOptions {
    RetrievalOptions {
        min_results: 50,
        target_results: 100,
        ..RetrievalOptions::default()
    }
}

fn pipeline_with(sources: Vec<Source>, page_size: usize) -> SearchPipeline {
    let settings = PipelineSettings {
        page_size,
        ..PipelineSettings::default()
    };
    SearchPipeline::new(SourceRetriever::new(sources, exhaustive_options()), settings)
}

fn catalog_pipeline() -> SearchPipeline {
    let provider: Arc<dyn SearchProvider> = Arc::new(StaticCatalogProvider::new("catalog", test_listings()));
    pipeline_with(tiered_sources(provider), 10)
}

/// Always fails, counting calls
struct FailingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _query: &str,
        _opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::new("failing", ProviderErrorKind::Unknown, "upstream unavailable"))
    }
}

/// Delegates to a catalogue and counts calls
struct CountingProvider {
    inner: StaticCatalogProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn search(
        &self,
        query: &str,
        opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query, opts).await
    }
}

// ====== Search ======

#[tokio::test]
async fn test_model_search_end_to_end() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let request = SearchRequest::new("samsung galaxy s25");

    let page = pipeline.search(&request, &ctx, &CancellationToken::new()).await?;

    assert!(!page.products.is_empty());
    assert_eq!(page.search_info.detected_category, Category::MobilePhones);
    assert!(page.search_info.category_confidence >= 0.9);
    assert_eq!(page.search_info.query, "samsung galaxy s25");
    assert_eq!(page.pagination.current_page, 1);
    assert!(!page.pagination.has_prev_page);
    for product in &page.products {
        assert_ne!(product.domain, "reddit.com");
        assert!(!product.title.contains("Washing Machine"), "{}", product.title);
        assert!((0.0..=1.0).contains(&product.score));
        assert_eq!(product.currency, "INR");
    }
    Ok(())
}

#[tokio::test]
async fn test_appliance_search_excludes_phones() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let request = SearchRequest::new("washing machine");

    let page = pipeline.search(&request, &ctx, &CancellationToken::new()).await?;

    assert_eq!(page.search_info.detected_category, Category::HomeAppliances);
    assert!(!page.products.is_empty());
    for product in &page.products {
        assert!(!product.title.contains("Galaxy"), "{}", product.title);
    }
    Ok(())
}

/// Returns the same listings whatever the query
struct FixedProvider {
    listings: Vec<RawProviderResult>,
}

#[async_trait]
impl SearchProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(
        &self,
        _query: &str,
        _opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        Ok(self.listings.clone())
    }
}

#[tokio::test]
async fn test_appliance_phrasing_drops_phone_only_results() -> Result<()> {
    let provider: Arc<dyn SearchProvider> = Arc::new(FixedProvider {
        listings: test_listings().into_iter().take(1).collect(),
    });
    let pipeline = pipeline_with(vec![Source::new("fixed", SourceTier::Primary, provider)], 10);
    let ctx = PipelineContext::default();

    for query in ["front load washer", "top load washer 7kg"] {
        let request = SearchRequest::new(query);
        let page = pipeline.search(&request, &ctx, &CancellationToken::new()).await?;

        assert_eq!(page.search_info.detected_category, Category::HomeAppliances, "{query}");
        assert!(page.search_info.category_confidence > 0.7, "{query}");
        assert!(page.products.is_empty(), "{query}: {:?}", page.products);
    }
    Ok(())
}

#[tokio::test]
async fn test_duplicate_gtin_keeps_first_tier() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let request = SearchRequest::new("samsung galaxy s25");

    let results = pipeline.rank(&request, &ctx, &CancellationToken::new()).await?;

    let shared: Vec<_> = results
        .ranked
        .iter()
        .filter(|s| s.candidate.product_id.as_deref() == Some(SHARED_GTIN))
        .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].candidate.domain, "flipkart.com");
    assert_eq!(shared[0].candidate.tier, SourceTier::Primary);
    assert!(shared[0].candidate.corroborating_tiers.contains(&SourceTier::Secondary));

    let keys: HashSet<String> = results.ranked.iter().map(|s| dedup_key(&s.candidate)).collect();
    assert_eq!(keys.len(), results.ranked.len());
    Ok(())
}

#[tokio::test]
async fn test_scores_stay_in_unit_interval() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();

    for query in ["samsung galaxy s25", "washing machine", "5g phone under 1 lakh"] {
        let results = pipeline
            .rank(&SearchRequest::new(query), &ctx, &CancellationToken::new())
            .await?;
        for scored in &results.ranked {
            let s = &scored.scores;
            for value in [
                s.lexical,
                s.semantic,
                s.attribute,
                s.cross_modal,
                s.relevance,
                s.business,
                s.behavioral,
                s.rrf,
                s.final_score,
            ] {
                assert!((0.0..=1.0).contains(&value), "{query}: {s:?}");
            }
        }
        let finals: Vec<f64> = results.ranked.iter().map(|s| s.scores.final_score).collect();
        assert!(finals.windows(2).all(|w| w[0] >= w[1]));
    }
    Ok(())
}

#[tokio::test]
async fn test_search_is_deterministic() -> Result<()> {
    let pipeline = catalog_pipeline();
    let request = SearchRequest::new("samsung galaxy s25");

    let first = pipeline
        .search(&request, &PipelineContext::default(), &CancellationToken::new())
        .await?;
    let second = pipeline
        .search(&request, &PipelineContext::default(), &CancellationToken::new())
        .await?;

    assert_eq!(first.products, second.products);
    assert_eq!(first.pagination, second.pagination);
    Ok(())
}

#[tokio::test]
async fn test_price_sort_orders_products() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let request = SearchRequest::new("samsung galaxy s25").with_sort(SortBy::PriceLow);

    let page = pipeline.search(&request, &ctx, &CancellationToken::new()).await?;

    let prices: Vec<f64> = page
        .products
        .iter()
        .filter_map(|p| p.price.as_deref())
        .filter_map(shoprank::extract::parse_price)
        .collect();
    assert!(prices.len() >= 2);
    assert!(prices.windows(2).all(|w| w[0] <= w[1]), "{prices:?}");
    assert_eq!(page.search_info.applied_filters.sort_by, SortBy::PriceLow);
    Ok(())
}

#[tokio::test]
async fn test_analysis_confidence_dominates_alternatives() -> Result<()> {
    let pipeline = catalog_pipeline();

    for query in ["samsung galaxy s25", "under 50k camera phone", "lg washing machine", "gaming laptop"] {
        let analysis = pipeline.analyze(query, None)?;
        let cls = &analysis.classification;
        assert!((0.0..=1.0).contains(&cls.confidence));
        for alternative in &cls.alternatives {
            assert!(cls.confidence >= alternative.confidence, "{query}");
        }
    }

    let hinted = pipeline.analyze("galaxy", Some("computers"))?;
    assert_eq!(hinted.classification.primary_category, Category::Computers);
    Ok(())
}

// ====== Failure modes ======

#[tokio::test]
async fn test_all_sources_failing() {
    let provider = Arc::new(FailingProvider {
        calls: AtomicUsize::new(0),
    });
    let pipeline = pipeline_with(tiered_sources(provider.clone()), 10);
    let ctx = PipelineContext::default();

    let err = pipeline
        .search(&SearchRequest::new("samsung galaxy s25"), &ctx, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ShopRankError::AllSourcesFailed { attempted } if attempted >= 3));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.public_message(), "Failed to search products");
    assert!(provider.calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_filter_exhaustion_is_an_empty_page() -> Result<()> {
    let forum_only = vec![
        RawProviderResult::new(
            "Best phones 2024 discussion",
            "https://www.reddit.com/r/india/comments/18x2k1/best_phones/",
            "Samsung Galaxy S25 vs iPhone 15",
        ),
        RawProviderResult::new(
            "Samsung Galaxy S25 owners group",
            "https://www.facebook.com/groups/galaxys25owners",
            "Community for Samsung Galaxy S25 owners",
        ),
    ];
    let provider: Arc<dyn SearchProvider> = Arc::new(StaticCatalogProvider::new("forums", forum_only));
    let pipeline = pipeline_with(vec![Source::new("open-web", SourceTier::Tertiary, provider)], 10);

    let page = pipeline
        .search(
            &SearchRequest::new("samsung galaxy s25"),
            &PipelineContext::default(),
            &CancellationToken::new(),
        )
        .await?;

    assert!(page.products.is_empty());
    assert_eq!(page.pagination.total_results, 0);
    assert!(!page.pagination.has_next_page);
    Ok(())
}

#[tokio::test]
async fn test_invalid_requests() {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let cancel = CancellationToken::new();

    let err = pipeline.search(&SearchRequest::new("   "), &ctx, &cancel).await.unwrap_err();
    assert!(matches!(err, ShopRankError::InvalidQuery(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.public_message(), "Search query is required");

    let request = SearchRequest::new("samsung galaxy s25").with_category("groceries");
    let err = pipeline.search(&request, &ctx, &cancel).await.unwrap_err();
    assert!(matches!(err, ShopRankError::InvalidQuery(_)));

    let request = SearchRequest::new("samsung galaxy s25").with_category("all");
    assert!(pipeline.search(&request, &ctx, &cancel).await.is_ok());
}

#[tokio::test]
async fn test_cancelled_request() {
    let pipeline = catalog_pipeline();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .search(&SearchRequest::new("samsung galaxy s25"), &PipelineContext::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ShopRankError::Cancelled));
    assert_eq!(err.status_code(), 499);
}

// ====== Caching ======

#[tokio::test]
async fn test_later_pages_come_from_cache() -> Result<()> {
    let provider = Arc::new(CountingProvider {
        inner: StaticCatalogProvider::new("catalog", test_listings()),
        calls: AtomicUsize::new(0),
    });
    let sources = vec![Source::new("everything", SourceTier::Primary, provider.clone())];
    let pipeline = SearchPipeline::new(
        SourceRetriever::new(sources, RetrievalOptions::default()),
        PipelineSettings {
            page_size: 1,
            ..PipelineSettings::default()
        },
    );
    let ctx = PipelineContext::default();
    let cancel = CancellationToken::new();
    let request = SearchRequest::new("samsung galaxy s25");

    let first = pipeline.search(&request, &ctx, &cancel).await?;
    let calls_after_first = provider.calls.load(Ordering::SeqCst);
    assert!(calls_after_first >= 1);
    assert!(first.pagination.total_pages >= 2);
    assert!(first.pagination.has_next_page);
    assert_eq!(ctx.cache.len().await, first.pagination.total_pages);

    let second = pipeline.search(&request.clone().with_page(2), &ctx, &cancel).await?;
    assert_eq!(provider.calls.load(Ordering::SeqCst), calls_after_first);
    assert_eq!(second.pagination.current_page, 2);
    assert_eq!(second.pagination.total_results, first.pagination.total_results);
    assert!(second.pagination.has_prev_page);
    assert_ne!(second.products, first.products);

    // A fresh first page drops the cached pages and hits the providers again
    pipeline.search(&request, &ctx, &cancel).await?;
    assert!(provider.calls.load(Ordering::SeqCst) > calls_after_first);
    Ok(())
}

#[tokio::test]
async fn test_page_past_the_end() -> Result<()> {
    let pipeline = catalog_pipeline();
    let ctx = PipelineContext::default();
    let request = SearchRequest::new("samsung galaxy s25").with_page(50);

    let page = pipeline.search(&request, &ctx, &CancellationToken::new()).await?;

    assert!(page.products.is_empty());
    assert_eq!(page.pagination.current_page, 50);
    assert!(!page.pagination.has_next_page);
    assert!(page.pagination.total_results > 0);
    Ok(())
}

// ====== Default configuration ======

#[tokio::test]
async fn test_default_config_serves_demo_catalogue() -> Result<()> {
    let config = AppConfig::default();
    let pipeline = SearchPipeline::from_config(&config)?;
    assert_eq!(pipeline.retriever().sources().len(), 3);

    let page = pipeline
        .search(
            &SearchRequest::new("iphone 15"),
            &PipelineContext::default(),
            &CancellationToken::new(),
        )
        .await?;
    assert!(!page.products.is_empty());
    assert!(page.products.iter().all(|p| p.title.contains("iPhone")));
    Ok(())
}

// ====== HTTP ======

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let config = AppConfig::default();
    let state = AppState::new(catalog_pipeline(), PipelineContext::default(), false);
    let app = build_router(state, &config);

    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_search() {
    let (status, body) = get_json("/search?query=samsung%20galaxy%20s25&sortBy=rating").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!body["data"]["products"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["pagination"]["currentPage"], 1);
    assert_eq!(body["data"]["searchInfo"]["detectedCategory"], "mobile_phones");
    assert_eq!(body["data"]["searchInfo"]["appliedFilters"]["sortBy"], "rating");
}

#[tokio::test]
async fn test_http_validation_errors() {
    let (status, body) = get_json("/api/search?query=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Search query is required");
    assert!(body.get("error").is_none());

    let (status, body) = get_json("/api/search?query=phone&sortBy=cheapest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_http_auxiliary_endpoints() {
    let (status, body) = get_json("/api/search/suggestions?query=samsung").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["suggestions"][0], "samsung");

    let (status, body) = get_json("/search/trending").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["trending"].as_array().unwrap().is_empty());

    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");

    let (status, body) = get_json("/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cacheEntries"], 0);
}
