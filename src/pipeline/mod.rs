//! Search pipeline orchestration
//!
//! `SearchPipeline` owns the immutable stages; `PipelineContext` owns the
//! state shared across requests (result cache and provider statistics) and
//! is passed in explicitly so tests can start from a fresh one.

pub mod formatter;
pub mod suggest;

use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

pub use formatter::ResponseFormatter;

use crate::cache::cache_key;
use crate::cache::SearchCache;
use crate::classify::CategoryClassifier;
use crate::classify::EnsembleWeights;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::filter::EcommerceFilter;
use crate::models::Category;
use crate::models::CategoryClassification;
use crate::models::NormalizedQuery;
use crate::models::ScoredCandidate;
use crate::models::SearchRequest;
use crate::models::SearchResultPage;
use crate::query::QueryUnderstanding;
use crate::rerank::AdvancedFilterAndFuse;
use crate::rerank::FusionConfig;
use crate::retrieval::providers;
use crate::retrieval::ProviderStats;
use crate::retrieval::RetrievalReport;
use crate::retrieval::SourceRetriever;
use crate::scoring::RelevanceScorer;
use crate::scoring::RelevanceWeights;

/// Shared mutable state, constructed once per process (or per test)
#[derive(Default)]
pub struct PipelineContext {
    pub cache: SearchCache,
    pub stats: RwLock<ProviderStats>,
}

impl PipelineContext {
    pub fn new(cache: SearchCache) -> Self {
        Self {
            cache,
            stats: RwLock::new(ProviderStats::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub ensemble: EnsembleWeights,
    pub relevance: RelevanceWeights,
    pub fusion: FusionConfig,
    pub page_size: usize,
    pub cache_enabled: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ensemble: EnsembleWeights::default(),
            relevance: RelevanceWeights::default(),
            fusion: FusionConfig::default(),
            page_size: formatter::DEFAULT_PAGE_SIZE,
            cache_enabled: true,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ensemble: config.scoring.ensemble,
            relevance: config.scoring.relevance,
            fusion: config.scoring.fusion,
            page_size: config.pagination.page_size,
            cache_enabled: config.cache.enabled,
        }
    }
}

/// Query understanding plus category verdict, as shown by `analyze`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub query: NormalizedQuery,
    pub classification: CategoryClassification,
}

/// Full ranked list before pagination
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResults {
    pub analysis: QueryAnalysis,
    pub report: RetrievalReport,
    pub ranked: Vec<ScoredCandidate>,
}

/// Parse the caller's category hint; "all" and blank mean no hint
pub fn parse_category_hint(raw: Option<&str>) -> Result<Option<Category>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ShopRankError::Cancelled)
    } else {
        Ok(())
    }
}

pub struct SearchPipeline {
    understanding: QueryUnderstanding,
    classifier: CategoryClassifier,
    retriever: SourceRetriever,
    filter: EcommerceFilter,
    scorer: RelevanceScorer,
    fuse: AdvancedFilterAndFuse,
    formatter: ResponseFormatter,
    cache_enabled: bool,
}

impl SearchPipeline {
    pub fn new(retriever: SourceRetriever, settings: PipelineSettings) -> Self {
        Self {
            understanding: QueryUnderstanding::new(),
            classifier: CategoryClassifier::new(settings.ensemble),
            retriever,
            filter: EcommerceFilter::new(),
            scorer: RelevanceScorer::new(settings.relevance),
            fuse: AdvancedFilterAndFuse::new(settings.fusion),
            formatter: ResponseFormatter::new(settings.page_size),
            cache_enabled: settings.cache_enabled,
        }
    }

    /// Build every stage, including provider adapters, from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sources = providers::build_sources(
            &config.providers,
            &config.sources,
            config.retrieval.timeout(),
        )?;
        let retriever = SourceRetriever::new(sources, config.retrieval.to_options());
        Ok(Self::new(retriever, PipelineSettings::from_config(config)))
    }

    pub fn retriever(&self) -> &SourceRetriever {
        &self.retriever
    }

    pub fn formatter(&self) -> &ResponseFormatter {
        &self.formatter
    }

    /// Normalize and classify without touching any source
    pub fn analyze(&self, raw_query: &str, category: Option<&str>) -> Result<QueryAnalysis> {
        let hint = parse_category_hint(category)?;
        let query = self.understanding.extract_attributes(raw_query)?;
        Ok(self.classify(query, hint))
    }

    fn classify(&self, query: NormalizedQuery, hint: Option<Category>) -> QueryAnalysis {
        let classification = match hint {
            Some(category) => self.classifier.classify_with_hint(&query, category),
            None => self.classifier.classify(&query),
        };
        let query = self.understanding.build_variants(&query, &classification);
        QueryAnalysis { query, classification }
    }

    /// Retrieve, filter, score and fuse; no caching, no pagination
    pub async fn rank(
        &self,
        request: &SearchRequest,
        ctx: &PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<RankedResults> {
        let analysis = self.analyze(&request.query, request.category.as_deref())?;
        self.rank_analyzed(analysis, request, ctx, cancel).await
    }

    async fn rank_analyzed(
        &self,
        analysis: QueryAnalysis,
        request: &SearchRequest,
        ctx: &PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<RankedResults> {
        ensure_live(cancel)?;
        let QueryAnalysis { query, classification } = &analysis;

        let mut report = self
            .retriever
            .retrieve(query, classification, request.price_range, &ctx.stats, cancel)
            .await?;
        if report.candidates.is_empty() {
            return Err(ShopRankError::AllSourcesFailed {
                attempted: report.attempted(),
            });
        }
        ensure_live(cancel)?;

        let candidates = std::mem::take(&mut report.candidates);
        let filtered = self.filter.filter(candidates, classification);
        let scored = self.scorer.score(filtered, query, classification);
        let ranked = self.fuse.finalize(scored, query, classification);
        ensure_live(cancel)?;

        Ok(RankedResults {
            analysis,
            report,
            ranked,
        })
    }

    /// One page of results for `request`
    ///
    /// A first-page request drops every cached page of its query and runs
    /// the pipeline; later pages are served from the cache when present.
    /// Every page of a fresh run is cached.
    pub async fn search(
        &self,
        request: &SearchRequest,
        ctx: &PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<SearchResultPage> {
        let started = Instant::now();
        let hint = parse_category_hint(request.category.as_deref())?;
        let query = self.understanding.extract_attributes(&request.query)?;
        let page = request.page.max(1);
        let hint_name = hint.map(Category::as_str);

        if self.cache_enabled {
            if page == 1 {
                ctx.cache.invalidate_query(&query.normalized).await;
            } else {
                let key = cache_key(&query.normalized, hint_name, request.price_range, request.sort_by, page);
                if let Some(cached) = ctx.cache.get(&key).await {
                    debug!("Serving page {} of '{}' from cache", page, query.normalized);
                    return Ok(cached);
                }
            }
        }

        let analysis = self.classify(query, hint);
        let normalized = analysis.query.normalized.clone();
        let results = self.rank_analyzed(analysis, request, ctx, cancel).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let classification = &results.analysis.classification;
        let mut pages = self
            .formatter
            .format_pages(&results.ranked, request, classification, elapsed_ms);
        let requested = if page <= pages.len() {
            pages.swap_remove(page - 1)
        } else {
            self.formatter
                .format_page(&results.ranked, request, classification, elapsed_ms)
        };

        if self.cache_enabled {
            let mut stored = 0;
            for cached in pages.into_iter().chain(std::iter::once(requested.clone())) {
                let key = cache_key(
                    &normalized,
                    hint_name,
                    request.price_range,
                    request.sort_by,
                    cached.pagination.current_page,
                );
                ctx.cache.put(key, &normalized, cached).await;
                stored += 1;
            }
            debug!("Cached {} pages for '{}'", stored, normalized);
        }

        info!(
            "Search '{}' page {}: {} of {} results in {}ms",
            request.query.trim(),
            page,
            requested.products.len(),
            requested.pagination.total_results,
            elapsed_ms
        );
        Ok(requested)
    }
}
