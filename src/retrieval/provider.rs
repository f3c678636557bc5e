//! Search provider capability and payload normalization
//!
//! Every upstream (web search API, shopping API, static catalog) is
//! reached through `SearchProvider`. Adapters translate their own wire
//! format into `RawProviderResult`; `to_candidate` turns that into the
//! pipeline's `Candidate`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::ProviderError;
use crate::extract::domain_of;
use crate::extract::normalize_url;
use crate::extract::parse_price;
use crate::extract::AttributeExtractor;
use crate::models::Availability;
use crate::models::Candidate;
use crate::models::SourceTier;

/// Structured metadata attached to a result, keyed by section name
///
/// Mirrors the `pagemap` shape of web search APIs: each section holds a
/// list of flat string maps, e.g. `product → [{name, price}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageMap {
    pub sections: BTreeMap<String, Vec<BTreeMap<String, String>>>,
}

impl PageMap {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// First value of `key` in any entry of `section`
    pub fn first(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .iter()
            .find_map(|entry| entry.get(key))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// First hit among `(section, key)` pairs, in order
    pub fn first_of(&self, keys: &[(&str, &str)]) -> Option<&str> {
        keys.iter().find_map(|(section, key)| self.first(section, key))
    }

    /// Schema.org-like product or offer markup is present
    pub fn has_product_markup(&self) -> bool {
        ["product", "offer", "aggregaterating"]
            .iter()
            .any(|s| self.sections.get(*s).is_some_and(|entries| !entries.is_empty()))
    }

    /// Build from an upstream JSON `pagemap`, stringifying scalar values
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut sections = BTreeMap::new();
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        for (section, entries) in object {
            let Some(entries) = entries.as_array() else {
                continue;
            };
            let parsed: Vec<BTreeMap<String, String>> = entries
                .iter()
                .filter_map(serde_json::Value::as_object)
                .map(|entry| {
                    entry
                        .iter()
                        .filter_map(|(k, v)| {
                            let text = match v {
                                serde_json::Value::String(s) => s.clone(),
                                serde_json::Value::Number(n) => n.to_string(),
                                serde_json::Value::Bool(b) => b.to_string(),
                                _ => return None,
                            };
                            Some((k.to_lowercase(), text))
                        })
                        .collect()
                })
                .collect();
            sections.insert(section.to_lowercase(), parsed);
        }
        Self { sections }
    }

    #[must_use]
    pub fn with_entry(mut self, section: &str, entry: &[(&str, &str)]) -> Self {
        self.sections.entry(section.to_string()).or_default().push(
            entry
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }
}

/// One result as returned by a provider adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub pagemap: PageMap,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl RawProviderResult {
    pub fn new(title: impl Into<String>, link: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            ..Default::default()
        }
    }
}

/// Per-call options passed to every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    pub max_results: usize,
    pub region: String,
    pub language: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            region: "in".to_string(),
            language: "en".to_string(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError>;
}

const PRICE_KEYS: &[(&str, &str)] = &[
    ("offer", "price"),
    ("product", "price"),
    ("metatags", "product:price:amount"),
    ("metatags", "og:price:amount"),
];
const RATING_KEYS: &[(&str, &str)] = &[
    ("aggregaterating", "ratingvalue"),
    ("product", "ratingvalue"),
    ("review", "ratingvalue"),
];
const REVIEW_KEYS: &[(&str, &str)] = &[
    ("aggregaterating", "reviewcount"),
    ("aggregaterating", "ratingcount"),
    ("product", "reviewcount"),
];
const IMAGE_KEYS: &[(&str, &str)] = &[
    ("cse_image", "src"),
    ("product", "image"),
    ("metatags", "og:image"),
    ("cse_thumbnail", "src"),
];
const AVAILABILITY_KEYS: &[(&str, &str)] = &[
    ("offer", "availability"),
    ("product", "availability"),
    ("metatags", "product:availability"),
];
const PRODUCT_ID_KEYS: &[(&str, &str)] = &[
    ("product", "gtin13"),
    ("product", "gtin"),
    ("offer", "gtin13"),
];

/// Render a numeric price as a rupee string; strings that already carry a symbol pass through
fn format_price(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        let value = parse_price(trimmed)?;
        Some(format!("₹{}", group_indian(value.round() as u64)))
    } else {
        Some(trimmed.to_string())
    }
}

/// Indian digit grouping: 300000 → 3,00,000
pub fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

fn availability_from(value: &str, extractor: &AttributeExtractor) -> Availability {
    let lower = value.to_lowercase();
    if lower.ends_with("instock") || lower == "in stock" || lower == "in_stock" {
        Availability::InStock
    } else if lower.ends_with("outofstock") || lower == "out of stock" || lower == "out_of_stock" {
        Availability::OutOfStock
    } else {
        extractor.availability(&lower)
    }
}

/// Normalize a provider result into a candidate; `None` when the link is unusable
pub fn to_candidate(
    raw: &RawProviderResult,
    provider: &str,
    tier: SourceTier,
    extractor: &AttributeExtractor,
) -> Option<Candidate> {
    let url = normalize_url(&raw.link)?;
    let domain = domain_of(&url)?;
    let text = format!("{} {}", raw.title, raw.snippet);
    let pagemap = &raw.pagemap;

    let price = raw
        .price
        .as_deref()
        .and_then(format_price)
        .or_else(|| pagemap.first_of(PRICE_KEYS).and_then(format_price))
        .or_else(|| extractor.price_in_text(&text));

    let rating = raw
        .rating
        .or_else(|| pagemap.first_of(RATING_KEYS).and_then(|v| v.trim().parse().ok()))
        .or_else(|| extractor.rating_in_text(&text))
        .filter(|r| (0.0..=5.0).contains(r));

    let review_count = raw
        .review_count
        .or_else(|| {
            pagemap
                .first_of(REVIEW_KEYS)
                .and_then(|v| v.replace(',', "").trim().parse().ok())
        })
        .or_else(|| extractor.review_count_in_text(&text));

    let image = raw
        .image
        .clone()
        .or_else(|| pagemap.first_of(IMAGE_KEYS).map(str::to_string))
        .and_then(|img| normalize_url(&img));

    let availability = raw
        .availability
        .as_deref()
        .or_else(|| pagemap.first_of(AVAILABILITY_KEYS))
        .map_or_else(|| extractor.availability(&text), |v| availability_from(v, extractor));

    let product_id = raw
        .product_id
        .clone()
        .or_else(|| pagemap.first_of(PRODUCT_ID_KEYS).map(str::to_string));

    Some(Candidate {
        title: raw.title.trim().to_string(),
        description: raw.snippet.trim().to_string(),
        url,
        domain,
        image,
        price,
        rating,
        review_count,
        availability,
        source_provider: provider.to_string(),
        tier,
        product_id,
        has_structured_data: pagemap.has_product_markup(),
        corroborating_tiers: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_indian() {
        assert_eq!(group_indian(999), "999");
        assert_eq!(group_indian(89999), "89,999");
        assert_eq!(group_indian(300000), "3,00,000");
        assert_eq!(group_indian(12345678), "1,23,45,678");
    }

    #[test]
    fn test_candidate_from_pagemap() {
        let raw = RawProviderResult {
            pagemap: PageMap::default()
                .with_entry("offer", &[("price", "89999"), ("availability", "https://schema.org/InStock")])
                .with_entry("aggregaterating", &[("ratingvalue", "4.5"), ("reviewcount", "1,234")])
                .with_entry("cse_image", &[("src", "https://img.example.com/s25.jpg")]),
            ..RawProviderResult::new(
                "Samsung Galaxy S25 Ultra",
                "www.flipkart.com/samsung-galaxy-s25/p/itm123",
                "Titanium Black, 256 GB",
            )
        };
        let candidate = to_candidate(&raw, "google_cse", SourceTier::Primary, &AttributeExtractor::new()).unwrap();

        assert_eq!(candidate.url, "https://www.flipkart.com/samsung-galaxy-s25/p/itm123");
        assert_eq!(candidate.domain, "flipkart.com");
        assert_eq!(candidate.price.as_deref(), Some("₹89,999"));
        assert_eq!(candidate.rating, Some(4.5));
        assert_eq!(candidate.review_count, Some(1234));
        assert_eq!(candidate.availability, Availability::InStock);
        assert_eq!(candidate.image.as_deref(), Some("https://img.example.com/s25.jpg"));
        assert!(candidate.has_structured_data);
        assert_eq!(candidate.tier, SourceTier::Primary);
    }

    #[test]
    fn test_candidate_from_snippet_text() {
        let raw = RawProviderResult::new(
            "Redmi Note 13",
            "https://www.amazon.in/dp/B0CQPHYFJL",
            "Buy now at ₹17,999. Rated 4.2 out of 5 from 3,210 ratings. Out of stock",
        );
        let candidate = to_candidate(&raw, "serpapi", SourceTier::Secondary, &AttributeExtractor::new()).unwrap();

        assert_eq!(candidate.price.as_deref(), Some("₹17,999"));
        assert_eq!(candidate.rating, Some(4.2));
        assert_eq!(candidate.review_count, Some(3210));
        assert_eq!(candidate.availability, Availability::OutOfStock);
        assert!(!candidate.has_structured_data);
    }

    #[test]
    fn test_unusable_link_is_dropped() {
        let raw = RawProviderResult::new("Broken", "   ", "");
        assert!(to_candidate(&raw, "p", SourceTier::Primary, &AttributeExtractor::new()).is_none());
    }
}
