//! In-memory catalogue provider
//!
//! Answers queries from a fixed list of listings. Used for offline runs,
//! the demo configuration and the pipeline tests. It understands the two
//! operators the retriever emits: `site:` restrictions and the shopping
//! intent OR-group, which it ignores.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::domain_matches;
use crate::errors::ProviderError;
use crate::errors::Result;
use crate::extract::domain_of;
use crate::extract::normalize_url;
use crate::extract::tokenize;
use crate::retrieval::provider::ProviderOptions;
use crate::retrieval::provider::RawProviderResult;
use crate::retrieval::provider::SearchProvider;

/// Query words that carry no product meaning
const OPERATOR_WORDS: &[&str] = &["or", "and", "buy", "shop", "price", "purchase"];

#[derive(Debug, Default)]
struct ParsedQuery {
    terms: Vec<String>,
    sites: Vec<String>,
    excluded: Vec<String>,
}

fn parse_query(query: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();
    for raw in query.split_whitespace() {
        let word = raw.trim_matches(|c| c == '(' || c == ')' || c == '"');
        if let Some(site) = word.strip_prefix("site:") {
            parsed.sites.push(site.to_lowercase());
        } else if let Some(excluded) = word.strip_prefix('-') {
            parsed.excluded.extend(tokenize(excluded));
        } else {
            parsed.terms.extend(
                tokenize(word)
                    .into_iter()
                    .filter(|t| !OPERATOR_WORDS.contains(&t.as_str())),
            );
        }
    }
    parsed.terms.dedup();
    parsed
}

pub struct StaticCatalogProvider {
    name: String,
    listings: Vec<RawProviderResult>,
}

impl StaticCatalogProvider {
    pub fn new(name: impl Into<String>, listings: Vec<RawProviderResult>) -> Self {
        Self {
            name: name.into(),
            listings,
        }
    }

    /// Load listings from a JSON array of `RawProviderResult`
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let listings: Vec<RawProviderResult> = serde_json::from_str(&content)?;
        Ok(Self::new(name, listings))
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    fn site_allowed(listing: &RawProviderResult, sites: &[String]) -> bool {
        if sites.is_empty() {
            return true;
        }
        normalize_url(&listing.link)
            .and_then(|url| domain_of(&url))
            .is_some_and(|domain| sites.iter().any(|site| domain_matches(&domain, site)))
    }
}

#[async_trait]
impl SearchProvider for StaticCatalogProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        let parsed = parse_query(query);
        if parsed.terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<(usize, &RawProviderResult)> = self
            .listings
            .iter()
            .filter(|listing| Self::site_allowed(listing, &parsed.sites))
            .filter_map(|listing| {
                let tokens = tokenize(&format!("{} {}", listing.title, listing.snippet));
                if parsed.excluded.iter().any(|e| tokens.contains(e)) {
                    return None;
                }
                let hits = parsed.terms.iter().filter(|t| tokens.contains(t)).count();
                (hits > 0).then_some((hits, listing))
            })
            .collect();

        // Stable: equal hit counts keep catalogue order
        matches.sort_by(|a, b| b.0.cmp(&a.0));
        let results: Vec<RawProviderResult> = matches
            .into_iter()
            .take(opts.max_results)
            .map(|(_, listing)| listing.clone())
            .collect();

        debug!("{}: {} listings match '{}'", self.name, results.len(), query);
        Ok(results)
    }
}
