use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::cache::CacheConfig as SearchCacheConfig;
use crate::classify::EnsembleWeights;
use crate::models::SourceTier;
use crate::rerank::FusionConfig;
use crate::retrieval::ProviderOptions;
use crate::retrieval::QueryStyle;
use crate::retrieval::RetrievalOptions;
use crate::retrieval::TierConcurrency;
use crate::scoring::RelevanceWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors: bool,
    /// Expose error details in API responses
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_concurrent_requests() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
            dev_mode: false,
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub min_results: usize,
    pub target_results: usize,
    pub timeout_ms: u64,
    pub concurrency: TierConcurrency,
    pub max_results_per_source: usize,
    pub region: String,
    pub language: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let defaults = RetrievalOptions::default();
        Self {
            min_results: defaults.min_results,
            target_results: defaults.target_results,
            timeout_ms: 10_000,
            concurrency: defaults.concurrency,
            max_results_per_source: defaults.provider.max_results,
            region: defaults.provider.region,
            language: defaults.provider.language,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn to_options(&self) -> RetrievalOptions {
        RetrievalOptions {
            min_results: self.min_results,
            target_results: self.target_results,
            timeout: self.timeout(),
            concurrency: self.concurrency,
            provider: ProviderOptions {
                max_results: self.max_results_per_source,
                region: self.region.clone(),
                language: self.language.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30 * 60,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    pub fn to_cache_config(&self) -> SearchCacheConfig {
        SearchCacheConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            max_entries: self.max_entries.max(1),
            enable_stats: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

/// Every tunable weight of the ranking stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub ensemble: EnsembleWeights,
    pub relevance: RelevanceWeights,
    pub fusion: FusionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    GoogleCse,
    Serpapi,
    StaticCatalog,
}

/// A search backend. Credentials are read from the named environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub engine_id_env: Option<String>,
    /// JSON listings file for `static_catalog`
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One retrieval source: a provider queried with a fixed style and site list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub provider: String,
    pub tier: SourceTier,
    #[serde(default)]
    pub query_style: QueryStyle,
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub min_interval_ms: u64,
    #[serde(default = "default_success_rate")]
    pub initial_success_rate: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_success_rate() -> f64 {
    0.9
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            warn!("Using config.example.toml. Create config.toml for production use.");
            Self::from_file("config.example.toml")
        } else {
            warn!("No config file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.pagination.page_size == 0 {
            return Err(crate::ShopRankError::Config(
                "pagination.page_size must be at least 1".to_string(),
            ));
        }
        if self.retrieval.target_results < self.retrieval.min_results {
            return Err(crate::ShopRankError::Config(format!(
                "retrieval.target_results ({}) is below retrieval.min_results ({})",
                self.retrieval.target_results, self.retrieval.min_results
            )));
        }
        for source in &self.sources {
            if !self.providers.iter().any(|p| p.name == source.provider) {
                return Err(crate::ShopRankError::Config(format!(
                    "source '{}' references unknown provider '{}'",
                    source.name, source.provider
                )));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    /// Offline configuration backed by the bundled demo catalogue
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig::default(),
            pagination: PaginationConfig::default(),
            scoring: ScoringConfig::default(),
            providers: vec![ProviderConfig {
                name: "demo".to_string(),
                kind: ProviderKind::StaticCatalog,
                endpoint: None,
                api_key_env: None,
                engine_id_env: None,
                catalog_path: Some("data/demo_catalog.json".to_string()),
                enabled: true,
            }],
            sources: vec![
                SourceConfig {
                    name: "demo-marketplaces".to_string(),
                    provider: "demo".to_string(),
                    tier: SourceTier::Primary,
                    query_style: QueryStyle::Shopping,
                    sites: vec!["amazon.in".to_string(), "flipkart.com".to_string()],
                    max_results: None,
                    min_interval_ms: 0,
                    initial_success_rate: default_success_rate(),
                    enabled: true,
                },
                SourceConfig {
                    name: "demo-retailers".to_string(),
                    provider: "demo".to_string(),
                    tier: SourceTier::Secondary,
                    query_style: QueryStyle::Expanded,
                    sites: vec![
                        "croma.com".to_string(),
                        "reliancedigital.in".to_string(),
                        "vijaysales.com".to_string(),
                    ],
                    max_results: None,
                    min_interval_ms: 0,
                    initial_success_rate: default_success_rate(),
                    enabled: true,
                },
                SourceConfig {
                    name: "demo-open-web".to_string(),
                    provider: "demo".to_string(),
                    tier: SourceTier::Tertiary,
                    query_style: QueryStyle::Plain,
                    sites: Vec::new(),
                    max_results: None,
                    min_interval_ms: 0,
                    initial_success_rate: 0.7,
                    enabled: true,
                },
            ],
        }
    }
}
