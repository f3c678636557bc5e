//! Concrete `SearchProvider` adapters and the registry that wires them to sources

pub mod google_cse;
pub mod serpapi;
pub mod static_catalog;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing::warn;

pub use google_cse::GoogleCseProvider;
pub use serpapi::SerpApiProvider;
pub use static_catalog::StaticCatalogProvider;

use crate::config::ProviderConfig;
use crate::config::ProviderKind;
use crate::config::SourceConfig;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::retrieval::SearchProvider;
use crate::retrieval::Source;

fn env_value(var: Option<&str>) -> Option<String> {
    var.and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
}

/// Instantiate one provider. `Ok(None)` when its credentials are not set.
pub fn build_provider(config: &ProviderConfig, timeout: Duration) -> Result<Option<Arc<dyn SearchProvider>>> {
    let provider: Arc<dyn SearchProvider> = match config.kind {
        ProviderKind::GoogleCse => {
            let (Some(api_key), Some(engine_id)) = (
                env_value(config.api_key_env.as_deref()),
                env_value(config.engine_id_env.as_deref()),
            ) else {
                warn!("Provider '{}' disabled: API key or engine id not set", config.name);
                return Ok(None);
            };
            let mut provider = GoogleCseProvider::new(&config.name, api_key, engine_id, timeout)?;
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Arc::new(provider)
        }
        ProviderKind::Serpapi => {
            let Some(api_key) = env_value(config.api_key_env.as_deref()) else {
                warn!("Provider '{}' disabled: API key not set", config.name);
                return Ok(None);
            };
            let mut provider = SerpApiProvider::new(&config.name, api_key, timeout)?;
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Arc::new(provider)
        }
        ProviderKind::StaticCatalog => {
            let path = config.catalog_path.as_deref().ok_or_else(|| {
                ShopRankError::Config(format!("provider '{}' needs catalog_path", config.name))
            })?;
            let provider = StaticCatalogProvider::from_file(&config.name, path)?;
            info!("Loaded {} listings for '{}' from {}", provider.len(), config.name, path);
            Arc::new(provider)
        }
    };
    Ok(Some(provider))
}

/// Sources in config order, which is also their priority within a tier
///
/// Sources whose provider is disabled or lacks credentials are dropped with
/// a warning. Ending up with no sources at all is a configuration error.
pub fn build_sources(
    providers: &[ProviderConfig],
    sources: &[SourceConfig],
    timeout: Duration,
) -> Result<Vec<Source>> {
    let mut registry: HashMap<&str, Arc<dyn SearchProvider>> = HashMap::new();
    for config in providers.iter().filter(|p| p.enabled) {
        if let Some(provider) = build_provider(config, timeout)? {
            registry.insert(config.name.as_str(), provider);
        }
    }

    let built: Vec<Source> = sources
        .iter()
        .filter(|s| s.enabled)
        .enumerate()
        .filter_map(|(priority, config)| {
            let Some(provider) = registry.get(config.provider.as_str()) else {
                warn!("Source '{}' skipped: provider '{}' unavailable", config.name, config.provider);
                return None;
            };
            let mut source = Source::new(&config.name, config.tier, Arc::clone(provider))
                .with_style(config.query_style)
                .with_sites(config.sites.clone())
                .with_min_interval(Duration::from_millis(config.min_interval_ms))
                .with_priority(u32::try_from(priority).unwrap_or(u32::MAX))
                .with_initial_success_rate(config.initial_success_rate);
            if let Some(max_results) = config.max_results {
                source = source.with_max_results(max_results);
            }
            Some(source)
        })
        .collect();

    if built.is_empty() {
        return Err(ShopRankError::Config(
            "no usable search sources; check [[providers]] credentials".to_string(),
        ));
    }
    info!("Configured {} search sources", built.len());
    Ok(built)
}
