//! Tiered multi-source candidate retrieval
//!
//! Sources are grouped into primary, secondary and tertiary tiers and
//! walked through a `FallbackChain`. Inside a tier, sources are ordered by
//! priority then empirical success rate, and dispatched in chunks of the
//! tier's concurrency limit. Every chunk is joined all-settled, so one
//! slow or failing provider never hides its siblings' results.

pub mod provider;
pub mod providers;
pub mod stats;
pub mod strategy;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use futures::future::join_all;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use provider::to_candidate;
pub use provider::PageMap;
pub use provider::ProviderOptions;
pub use provider::RawProviderResult;
pub use provider::SearchProvider;
pub use stats::ProviderStats;
pub use strategy::FallbackChain;
pub use strategy::Gate;
pub use strategy::Strategy;
pub use strategy::StrategyKind;

use crate::errors::ProviderError;
use crate::errors::ProviderErrorKind;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::extract::AttributeExtractor;
use crate::models::Candidate;
use crate::models::CategoryClassification;
use crate::models::NormalizedQuery;
use crate::models::PriceRange;
use crate::models::SourceTier;

/// Below this classifier confidence the category-specific variant is not trusted
const CATEGORY_VARIANT_MIN_CONFIDENCE: f64 = 0.5;

const SHOPPING_INTENT: &str = "(buy OR shop OR price OR purchase)";

/// Which query variant a source receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStyle {
    /// Category-specific variant with shopping intent and site restriction
    #[default]
    Shopping,
    Exact,
    Expanded,
    /// Normalized text only
    Plain,
}

/// One configured upstream: a provider plus how and how often to call it
#[derive(Clone)]
pub struct Source {
    pub name: String,
    pub tier: SourceTier,
    pub provider: Arc<dyn SearchProvider>,
    pub query_style: QueryStyle,
    pub sites: Vec<String>,
    pub max_results: usize,
    pub min_interval: Duration,
    /// Lower runs first within a tier
    pub priority: u32,
    pub initial_success_rate: f64,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("provider", &self.provider.name())
            .field("query_style", &self.query_style)
            .field("sites", &self.sites)
            .field("max_results", &self.max_results)
            .field("min_interval", &self.min_interval)
            .field("priority", &self.priority)
            .finish()
    }
}

impl Source {
    pub fn new(name: impl Into<String>, tier: SourceTier, provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            name: name.into(),
            tier,
            provider,
            query_style: QueryStyle::Shopping,
            sites: Vec::new(),
            max_results: 10,
            min_interval: Duration::ZERO,
            priority: 0,
            initial_success_rate: 0.9,
        }
    }

    #[must_use]
    pub fn with_sites(mut self, sites: Vec<String>) -> Self {
        self.sites = sites;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: QueryStyle) -> Self {
        self.query_style = style;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_initial_success_rate(mut self, rate: f64) -> Self {
        self.initial_success_rate = rate;
        self
    }
}

/// Parallel calls allowed per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConcurrency {
    pub primary: usize,
    pub secondary: usize,
    pub tertiary: usize,
}

impl Default for TierConcurrency {
    fn default() -> Self {
        Self {
            primary: 3,
            secondary: 2,
            tertiary: 1,
        }
    }
}

impl TierConcurrency {
    pub fn for_tier(&self, tier: SourceTier) -> usize {
        let limit = match tier {
            SourceTier::Primary => self.primary,
            SourceTier::Secondary => self.secondary,
            SourceTier::Tertiary => self.tertiary,
        };
        limit.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub min_results: usize,
    pub target_results: usize,
    pub timeout: Duration,
    pub concurrency: TierConcurrency,
    pub provider: ProviderOptions,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            min_results: 10,
            target_results: 20,
            timeout: Duration::from_secs(10),
            concurrency: TierConcurrency::default(),
            provider: ProviderOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed(ProviderErrorKind),
    /// Called too soon after the previous request
    SkippedRateLimit,
    /// Provider ran out of quota earlier in this request
    SkippedExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub tier: SourceTier,
    pub strategy: String,
    pub status: SourceStatus,
    pub candidates: usize,
}

/// Everything one retrieval run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalReport {
    pub candidates: Vec<Candidate>,
    pub outcomes: Vec<SourceOutcome>,
    pub strategies_run: Vec<String>,
}

impl RetrievalReport {
    /// Calls actually issued, skips excluded
    pub fn attempted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Succeeded | SourceStatus::Failed(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Failed(_)))
            .count()
    }
}

type ProviderResult = std::result::Result<Vec<RawProviderResult>, ProviderError>;

#[derive(Default)]
struct RunState {
    report: RetrievalReport,
    exhausted: HashSet<String>,
}

/// Query string for one source
pub fn build_query_string(
    source: &Source,
    query: &NormalizedQuery,
    classification: &CategoryClassification,
    price_range: Option<PriceRange>,
) -> String {
    let variant = match source.query_style {
        QueryStyle::Shopping if classification.confidence >= CATEGORY_VARIANT_MIN_CONFIDENCE => {
            query.retrieval_text()
        }
        QueryStyle::Shopping | QueryStyle::Expanded => &query.expanded_variant,
        QueryStyle::Exact => &query.exact_match_variant,
        QueryStyle::Plain => return query.normalized.clone(),
    };

    let mut parts = vec![variant.to_string(), SHOPPING_INTENT.to_string()];
    if let Some(range) = price_range {
        parts.push(range.hint_terms().to_string());
    }
    if !source.sites.is_empty() {
        let sites: Vec<String> = source.sites.iter().map(|s| format!("site:{s}")).collect();
        parts.push(format!("({})", sites.join(" OR ")));
    }
    parts.join(" ")
}

pub struct SourceRetriever {
    sources: Vec<Source>,
    chain: FallbackChain,
    options: RetrievalOptions,
    extractor: AttributeExtractor,
}

impl SourceRetriever {
    pub fn new(sources: Vec<Source>, options: RetrievalOptions) -> Self {
        Self {
            sources,
            chain: FallbackChain::default(),
            options,
            extractor: AttributeExtractor::new(),
        }
    }

    #[must_use]
    pub fn with_chain(mut self, chain: FallbackChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    /// Walk the fallback chain. Provider failures are absorbed; only
    /// cancellation is an error. An empty report means every source failed.
    pub async fn retrieve(
        &self,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
        price_range: Option<PriceRange>,
        stats: &RwLock<ProviderStats>,
        cancel: &CancellationToken,
    ) -> Result<RetrievalReport> {
        let started = Instant::now();
        let mut state = RunState::default();

        for step in self.chain.steps() {
            let collected = state.report.candidates.len();
            if !step
                .gate
                .allows(collected, self.options.min_results, self.options.target_results)
            {
                debug!("Skipping {} with {} candidates collected", step, collected);
                continue;
            }

            info!("Retrieving from {} ({} candidates so far)", step, collected);
            state.report.strategies_run.push(step.to_string());
            let attempt = match step.kind {
                StrategyKind::Tier(tier) => {
                    self.run_tier(tier, step, query, classification, price_range, stats, cancel, &mut state)
                        .await
                }
                StrategyKind::Unrestricted => {
                    self.run_unrestricted(step, query, stats, cancel, &mut state)
                        .await
                }
            };
            attempt?;
        }

        info!(
            "Retrieval finished: {} candidates from {} calls ({} failed) in {}ms",
            state.report.candidates.len(),
            state.report.attempted(),
            state.report.failed(),
            started.elapsed().as_millis()
        );
        Ok(state.report)
    }

    async fn run_tier(
        &self,
        tier: SourceTier,
        step: &Strategy,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
        price_range: Option<PriceRange>,
        stats: &RwLock<ProviderStats>,
        cancel: &CancellationToken,
        state: &mut RunState,
    ) -> Result<()> {
        let mut sources: Vec<&Source> = self.sources.iter().filter(|s| s.tier == tier).collect();
        {
            let guard = stats.read().await;
            sources.sort_by(|a, b| {
                a.priority.cmp(&b.priority).then_with(|| {
                    guard
                        .success_rate(&b.name, b.initial_success_rate)
                        .total_cmp(&guard.success_rate(&a.name, a.initial_success_rate))
                })
            });
        }

        for chunk in sources.chunks(self.options.concurrency.for_tier(tier)) {
            if cancel.is_cancelled() {
                return Err(ShopRankError::Cancelled);
            }

            let runnable = self.admit(chunk, step, stats, state).await;
            if runnable.is_empty() {
                continue;
            }

            let calls = runnable.iter().map(|source| {
                let query_string = build_query_string(source, query, classification, price_range);
                self.call(source, query_string)
            });

            let settled = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ShopRankError::Cancelled),
                settled = join_all(calls) => settled,
            };
            self.record(settled, step, stats, state).await;
        }
        Ok(())
    }

    /// Last resort: plain text, no site restriction, first provider with results wins
    async fn run_unrestricted(
        &self,
        step: &Strategy,
        query: &NormalizedQuery,
        stats: &RwLock<ProviderStats>,
        cancel: &CancellationToken,
        state: &mut RunState,
    ) -> Result<()> {
        let mut tried: HashSet<&str> = HashSet::new();
        for source in &self.sources {
            let provider = source.provider.name();
            if !tried.insert(provider) || state.exhausted.contains(provider) {
                continue;
            }

            stats
                .write()
                .await
                .mark_request(&source.name, source.initial_success_rate, Instant::now());
            let settled = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ShopRankError::Cancelled),
                settled = self.call(source, query.normalized.clone()) => settled,
            };

            let before = state.report.candidates.len();
            self.record(vec![settled], step, stats, state).await;
            if state.report.candidates.len() > before {
                break;
            }
        }
        Ok(())
    }

    /// Rate-limit and quota checks, run sequentially before a chunk is dispatched
    async fn admit<'a>(
        &self,
        chunk: &[&'a Source],
        step: &Strategy,
        stats: &RwLock<ProviderStats>,
        state: &mut RunState,
    ) -> Vec<&'a Source> {
        let mut guard = stats.write().await;
        let now = Instant::now();
        let mut runnable = Vec::with_capacity(chunk.len());

        for source in chunk {
            let status = if state.exhausted.contains(source.provider.name()) {
                Some(SourceStatus::SkippedExhausted)
            } else if guard.is_rate_limited(&source.name, source.min_interval, now) {
                Some(SourceStatus::SkippedRateLimit)
            } else {
                None
            };

            match status {
                Some(status) => {
                    info!("Skipping {}: {:?}", source.name, status);
                    state.report.outcomes.push(SourceOutcome {
                        source: source.name.clone(),
                        tier: source.tier,
                        strategy: step.to_string(),
                        status,
                        candidates: 0,
                    });
                }
                None => {
                    guard.mark_request(&source.name, source.initial_success_rate, now);
                    runnable.push(*source);
                }
            }
        }
        runnable
    }

    async fn call<'a>(&'a self, source: &'a Source, query_string: String) -> (&'a Source, ProviderResult) {
        debug!("Querying {} with '{}'", source.name, query_string);
        let opts = ProviderOptions {
            max_results: source.max_results,
            ..self.options.provider.clone()
        };
        let result = match tokio::time::timeout(
            self.options.timeout,
            source.provider.search(&query_string, &opts),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(source.provider.name())),
        };
        (source, result)
    }

    /// Fold a settled chunk into stats and the report
    async fn record(
        &self,
        settled: Vec<(&Source, ProviderResult)>,
        step: &Strategy,
        stats: &RwLock<ProviderStats>,
        state: &mut RunState,
    ) {
        let mut guard = stats.write().await;
        for (source, result) in settled {
            let (status, candidates) = match result {
                Ok(raw) => {
                    guard.record_outcome(&source.name, source.initial_success_rate, true);
                    let candidates: Vec<Candidate> = raw
                        .iter()
                        .take(source.max_results)
                        .filter_map(|r| to_candidate(r, &source.name, source.tier, &self.extractor))
                        .collect();
                    info!("{}: {} candidates", source.name, candidates.len());
                    (SourceStatus::Succeeded, candidates)
                }
                Err(err) => {
                    guard.record_outcome(&source.name, source.initial_success_rate, false);
                    warn!("{} failed: {}", source.name, err);
                    if err.is_quota_exhausted() {
                        state.exhausted.insert(source.provider.name().to_string());
                    }
                    (SourceStatus::Failed(err.kind), Vec::new())
                }
            };

            state.report.outcomes.push(SourceOutcome {
                source: source.name.clone(),
                tier: source.tier,
                strategy: step.to_string(),
                status,
                candidates: candidates.len(),
            });
            state.report.candidates.extend(candidates);
        }
    }
}
