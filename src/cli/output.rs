//! CLI output formatting utilities

use crate::config::AppConfig;
use crate::models::SearchResultPage;
use crate::pipeline::QueryAnalysis;

/// Truncate at a character boundary, appending "..." when shortened
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

pub fn print_info(message: &str) {
    println!("ℹ️  {message}");
}

pub fn print_search_page(page: &SearchResultPage) {
    let info = &page.search_info;
    println!(
        "🔍 \"{}\" → {} ({:.0}% confidence), {} results in {}ms",
        info.query,
        info.detected_category,
        info.category_confidence * 100.0,
        page.pagination.total_results,
        info.search_time_ms
    );
    println!();

    if page.products.is_empty() {
        print_info("No products found");
        return;
    }

    println!(
        "{:<4} {:<52} {:>12} {:>6} {:<20} {:>6}",
        "#", "Title", "Price", "Rating", "Seller", "Score"
    );
    println!("{}", "-".repeat(106));
    for (i, product) in page.products.iter().enumerate() {
        println!(
            "{:<4} {:<52} {:>12} {:>6} {:<20} {:>6.3}",
            i + 1,
            truncate_str(&product.title, 48),
            product.price.as_deref().unwrap_or("-"),
            product.rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
            truncate_str(&product.seller, 18),
            product.score
        );
    }
    println!();
    println!(
        "Page {} of {}{}",
        page.pagination.current_page,
        page.pagination.total_pages,
        if page.pagination.has_next_page { " (use --page for more)" } else { "" }
    );
}

pub fn print_analysis(analysis: &QueryAnalysis) {
    let query = &analysis.query;
    let classification = &analysis.classification;

    println!("🧠 Query analysis");
    println!("  Original:   {}", query.original);
    println!("  Normalized: {}", query.normalized);
    println!("  Exact:      {}", query.exact_match_variant);
    println!("  Expanded:   {}", query.expanded_variant);
    println!("  Category:   {}", query.retrieval_text());
    println!(
        "  Intent:     {:?} ({:.2})",
        query.intent.intent, query.intent.confidence
    );
    println!("  Confidence: {:.2}", query.confidence);

    let attrs = &query.attributes;
    println!("  Attributes:");
    println!("    brand:   {}", attrs.brand.as_deref().unwrap_or("-"));
    println!("    series:  {}", attrs.series.as_deref().unwrap_or("-"));
    println!("    model:   {}", attrs.model.as_deref().unwrap_or("-"));
    println!(
        "    storage: {}",
        attrs
            .storage
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| format!("{} {}", s.value, s.unit))
    );
    println!("    color:   {}", attrs.color.as_deref().unwrap_or("-"));
    if let Some(budget) = &query.budget {
        println!(
            "  Budget:     {:?} min={:?} max={:?} target={:?}",
            budget.kind, budget.min, budget.max, budget.target
        );
    }
    for feature in &query.features {
        println!("  Feature:    {} ({:?})", feature.name, feature.priority);
    }

    println!();
    println!(
        "🏷️  Category: {} (confidence {:.2}, uncertainty {:?})",
        classification.primary_category, classification.confidence, classification.uncertainty
    );
    for alt in &classification.alternatives {
        println!("  alternative: {} ({:.2}) {}", alt.category, alt.confidence, alt.reason);
    }
}

pub fn print_config(config: &AppConfig) {
    println!("📋 ShopRank Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Address: {}", config.bind_address());
    println!("  CORS: {}", config.server.cors);
    println!("  Development mode: {}", config.server.dev_mode);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🔎 Retrieval:");
    println!(
        "  Results: min {} / target {}",
        config.retrieval.min_results, config.retrieval.target_results
    );
    println!(
        "  Concurrency: primary {} / secondary {} / tertiary {}",
        config.retrieval.concurrency.primary,
        config.retrieval.concurrency.secondary,
        config.retrieval.concurrency.tertiary
    );
    println!("  Timeout: {}ms", config.retrieval.timeout_ms);
    println!(
        "  Region / language: {} / {}",
        config.retrieval.region, config.retrieval.language
    );
    println!();

    println!("💾 Cache:");
    println!("  Enabled: {}", config.cache.enabled);
    println!("  TTL: {}s", config.cache.ttl_secs);
    println!("  Max entries: {}", config.cache.max_entries);
    println!("  Page size: {}", config.pagination.page_size);
    println!();

    println!("🔌 Providers:");
    for provider in &config.providers {
        let credentials = provider
            .api_key_env
            .as_deref()
            .map_or_else(String::new, |var| {
                let set = std::env::var(var).is_ok_and(|v| !v.is_empty());
                format!(" key=${var} ({})", if set { "set" } else { "missing" })
            });
        println!(
            "  - {} [{:?}]{}{}",
            provider.name,
            provider.kind,
            credentials,
            if provider.enabled { "" } else { " (disabled)" }
        );
    }
    println!();

    println!("📚 Sources:");
    for source in &config.sources {
        println!(
            "  - {} via {} [{}, {:?}] {}",
            source.name,
            source.provider,
            source.tier,
            source.query_style,
            if source.sites.is_empty() {
                "unrestricted".to_string()
            } else {
                source.sites.join(", ")
            }
        );
    }
}
