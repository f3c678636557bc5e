//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use crate::config::*;
    use crate::models::SourceTier;
    use crate::retrieval::QueryStyle;
    use crate::ShopRankError;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // ====== Default Value Tests ======

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert!(!config.server.dev_mode);
        assert_eq!(config.retrieval.min_results, 10);
        assert_eq!(config.retrieval.target_results, 20);
        assert_eq!(config.retrieval.concurrency.primary, 3);
        assert_eq!(config.retrieval.concurrency.secondary, 2);
        assert_eq!(config.retrieval.concurrency.tertiary, 1);
        assert_eq!(config.retrieval.timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.pagination.page_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_scoring_weights() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.ensemble.rule_based, 0.4);
        assert_eq!(scoring.relevance.semantic, 0.35);
        assert_eq!(scoring.fusion.rrf_k, 60.0);
        assert_eq!(scoring.fusion.rrf_weight, 0.6);
        assert_eq!(scoring.fusion.business_weight, 0.4);
    }

    #[test]
    fn test_default_sources_cover_every_tier() {
        let config = AppConfig::default();
        for tier in [SourceTier::Primary, SourceTier::Secondary, SourceTier::Tertiary] {
            assert!(config.sources.iter().any(|s| s.tier == tier));
        }
        assert!(config.sources.iter().all(|s| s.provider == "demo"));
    }

    // ====== File Parsing Tests ======

    #[test]
    fn test_from_file_with_partial_sections() {
        let file = write_config(
            r#"
[server]
port = 8080
dev_mode = true

[retrieval]
min_results = 5
target_results = 15

[scoring.fusion]
rrf_k = 30.0

[[providers]]
name = "google"
kind = "google_cse"
api_key_env = "GOOGLE_API_KEY"
engine_id_env = "GOOGLE_CSE_ID"

[[sources]]
name = "marketplaces"
provider = "google"
tier = "primary"
sites = ["amazon.in", "flipkart.com"]
min_interval_ms = 1000

[[sources]]
name = "open-web"
provider = "google"
tier = "tertiary"
query_style = "plain"
"#,
        );

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.server.dev_mode);
        assert_eq!(config.retrieval.min_results, 5);
        assert_eq!(config.retrieval.concurrency.primary, 3);
        assert_eq!(config.scoring.fusion.rrf_k, 30.0);
        assert_eq!(config.scoring.fusion.rrf_weight, 0.6);
        assert_eq!(config.logging.level, "info");

        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::GoogleCse);
        assert!(config.providers[0].enabled);

        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].query_style, QueryStyle::Shopping);
        assert_eq!(config.sources[0].min_interval_ms, 1000);
        assert_eq!(config.sources[0].initial_success_rate, 0.9);
        assert_eq!(config.sources[1].tier, SourceTier::Tertiary);
        assert_eq!(config.sources[1].query_style, QueryStyle::Plain);
    }

    #[test]
    fn test_retrieval_options_conversion() {
        let file = write_config(
            r#"
[retrieval]
timeout_ms = 2500
max_results_per_source = 7
region = "us"
"#,
        );
        let config = AppConfig::from_file(file.path()).unwrap();
        let options = config.retrieval.to_options();
        assert_eq!(options.timeout, Duration::from_millis(2500));
        assert_eq!(options.provider.max_results, 7);
        assert_eq!(options.provider.region, "us");
        assert_eq!(options.provider.language, "en");
    }

    // ====== Validation Tests ======

    #[test]
    fn test_unknown_provider_reference_is_rejected() {
        let file = write_config(
            r#"
[[sources]]
name = "orphan"
provider = "nowhere"
tier = "primary"
"#,
        );
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ShopRankError::Config(_)));
    }

    #[test]
    fn test_invalid_bounds_are_rejected() {
        let file = write_config("[pagination]\npage_size = 0\n");
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ShopRankError::Config(_))
        ));

        let file = write_config("[retrieval]\nmin_results = 30\ntarget_results = 20\n");
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ShopRankError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[server\nport = ");
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ShopRankError::TomlParsing(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/shoprank.toml"),
            Err(ShopRankError::Io(_))
        ));
    }

    #[test]
    fn test_cache_config_conversion() {
        let cache = CacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_entries: 0,
        };
        let converted = cache.to_cache_config();
        assert_eq!(converted.ttl, Duration::from_secs(60));
        assert_eq!(converted.max_entries, 1);
    }
}
