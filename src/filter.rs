//! Lenient e-commerce filter
//!
//! Four gates run in order: domain, category, product signals and
//! deduplication. The gates favour recall; anything weak that slips
//! through is demoted later by scoring and fusion.

use std::collections::HashMap;

use tracing::debug;
use tracing::info;
use url::Url;

use crate::catalog;
use crate::catalog::domain_in;
use crate::extract::contains_any;
use crate::extract::product_id_from_url;
use crate::extract::url_key;
use crate::extract::AttributeExtractor;
use crate::models::Availability;
use crate::models::Candidate;
use crate::models::CategoryClassification;

/// The category gate only runs above this classifier confidence
pub const CATEGORY_GATE_CONFIDENCE: f64 = 0.7;

const MIN_SIGNAL_SCORE: i32 = 0;
const MAX_SIGNAL_SCORE: i32 = 10;

const PLACEHOLDER_IMAGE_MARKERS: &[&str] = &["placeholder", "no-image", "noimage", "default", "blank"];

/// Lowercased path segments of an absolute URL
fn path_segments(url: &str) -> Vec<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_lowercase).collect())
        })
        .unwrap_or_default()
}

/// Identifier two listings must share to count as the same product
pub fn dedup_key(candidate: &Candidate) -> String {
    candidate
        .product_id
        .clone()
        .or_else(|| product_id_from_url(&candidate.url))
        .unwrap_or_else(|| url_key(&candidate.url))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EcommerceFilter {
    extractor: AttributeExtractor,
}

impl EcommerceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(
        &self,
        candidates: Vec<Candidate>,
        classification: &CategoryClassification,
    ) -> Vec<Candidate> {
        let input = candidates.len();

        let by_domain: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| {
                let keep = Self::passes_domain_gate(&c.domain);
                if !keep {
                    debug!("Domain gate rejected {}", c.url);
                }
                keep
            })
            .collect();
        let after_domain = by_domain.len();

        let by_category: Vec<Candidate> = if classification.confidence > CATEGORY_GATE_CONFIDENCE {
            by_domain
                .into_iter()
                .filter(|c| {
                    let keep = Self::passes_category_gate(c, classification);
                    if !keep {
                        debug!("Category gate rejected '{}'", c.title);
                    }
                    keep
                })
                .collect()
        } else {
            by_domain
        };
        let after_category = by_category.len();

        let by_signals: Vec<Candidate> = by_category
            .into_iter()
            .filter(|c| {
                let score = self.signal_score(c);
                if score < MIN_SIGNAL_SCORE {
                    debug!("Signal gate rejected '{}' (score {})", c.title, score);
                }
                score >= MIN_SIGNAL_SCORE
            })
            .collect();
        let after_signals = by_signals.len();

        let survivors = Self::deduplicate(by_signals);
        info!(
            "Filtered {} candidates: domain {} -> category {} -> signals {} -> dedup {}",
            input,
            after_domain,
            after_category,
            after_signals,
            survivors.len()
        );
        survivors
    }

    /// Allowlist wins, then blocklist, then default-allow
    pub fn passes_domain_gate(domain: &str) -> bool {
        if domain_in(domain, catalog::SHOPPING_DOMAINS) {
            return true;
        }
        !domain_in(domain, catalog::BLOCKED_DOMAINS)
    }

    pub fn passes_category_gate(candidate: &Candidate, classification: &CategoryClassification) -> bool {
        let profile = catalog::profile(classification.primary_category);
        let text = candidate.text().to_lowercase();
        let included = contains_any(&text, profile.inclusion) || contains_any(&text, profile.semantic_primary);
        included && !contains_any(&text, profile.exclusion)
    }

    /// Product-page evidence minus informational and accessory evidence
    pub fn signal_score(&self, candidate: &Candidate) -> i32 {
        let text = candidate.text().to_lowercase();
        let segments = path_segments(&candidate.url);
        let mut score = 0;

        if candidate.price.is_some() {
            score += 2;
        }
        if contains_any(&text, catalog::BUY_KEYWORDS) {
            score += 2;
        }
        if candidate.product_id.is_some() || product_id_from_url(&candidate.url).is_some() {
            score += 1;
        }
        if candidate.has_structured_data {
            score += 1;
        }
        if candidate.availability != Availability::Unknown
            || contains_any(&text, catalog::AVAILABILITY_KEYWORDS)
        {
            score += 1;
        }
        if candidate.image.as_deref().is_some_and(|img| {
            let img = img.to_lowercase();
            !PLACEHOLDER_IMAGE_MARKERS.iter().any(|m| img.contains(m))
        }) {
            score += 1;
        }
        if segments
            .iter()
            .any(|s| catalog::ECOMMERCE_URL_SEGMENTS.contains(&s.as_str()))
        {
            score += 1;
        }
        if candidate.review_count.is_some_and(|n| n > 10) {
            score += 1;
        }
        score = score.min(MAX_SIGNAL_SCORE);

        if segments
            .iter()
            .any(|s| catalog::INFORMATIONAL_URL_SEGMENTS.contains(&s.as_str()))
        {
            score -= 1;
        }
        if contains_any(&text, catalog::INFORMATIONAL_KEYWORDS) {
            score -= 1;
        }
        if candidate.price.is_none() && domain_in(&candidate.domain, catalog::BRAND_DOMAINS) {
            score -= 1;
        }
        if contains_any(&text, catalog::ACCESSORY_KEYWORDS) && !self.is_main_product(&text) {
            score -= 2;
        }
        score
    }

    /// Brand with model, a storage size, a colour variant or a device noun
    fn is_main_product(&self, text: &str) -> bool {
        let attrs = self.extractor.extract(text);
        (attrs.brand.is_some() && attrs.model.is_some())
            || attrs.storage.is_some()
            || attrs.color.is_some()
            || contains_any(text, catalog::PRODUCT_TYPE_NOUNS)
    }

    /// First seen wins; the survivor remembers which other tiers returned it
    fn deduplicate(candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut survivors: Vec<Candidate> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let key = dedup_key(&candidate);
            if let Some(&index) = seen.get(&key) {
                let kept = &mut survivors[index];
                if kept.tier != candidate.tier && !kept.corroborating_tiers.contains(&candidate.tier) {
                    kept.corroborating_tiers.push(candidate.tier);
                }
                debug!("Dropped duplicate {} (key {})", candidate.url, key);
                continue;
            }
            seen.insert(key, survivors.len());
            survivors.push(candidate);
        }
        survivors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::models::SourceTier;
    use crate::models::Uncertainty;

    fn candidate(title: &str, url: &str) -> Candidate {
        let domain = crate::extract::domain_of(url).unwrap();
        Candidate {
            title: title.to_string(),
            description: String::new(),
            url: url.to_string(),
            domain,
            image: None,
            price: None,
            rating: None,
            review_count: None,
            availability: Availability::Unknown,
            source_provider: "test".to_string(),
            tier: SourceTier::Primary,
            product_id: None,
            has_structured_data: false,
            corroborating_tiers: Vec::new(),
        }
    }

    fn classification(category: Category, confidence: f64) -> CategoryClassification {
        CategoryClassification {
            primary_category: category,
            confidence,
            score: confidence,
            alternatives: Vec::new(),
            contributing_methods: Vec::new(),
            uncertainty: Uncertainty::Low,
        }
    }

    #[test]
    fn test_reddit_rejected_by_domain_gate() {
        let mut thread = candidate(
            "Best phones 2024 discussion",
            "https://www.reddit.com/r/android/comments/abc/best_phones_2024",
        );
        thread.price = Some("₹25,000".into());
        thread.description = "buy samsung galaxy phone in stock".into();

        let out = EcommerceFilter::new().filter(vec![thread], &classification(Category::MobilePhones, 0.95));
        assert!(out.is_empty());
    }

    #[test]
    fn test_domain_gate_defaults_to_allow() {
        assert!(EcommerceFilter::passes_domain_gate("flipkart.com"));
        assert!(EcommerceFilter::passes_domain_gate("some-unknown-store.in"));
        assert!(!EcommerceFilter::passes_domain_gate("youtube.com"));
        assert!(!EcommerceFilter::passes_domain_gate("phonereviews.example.com"));
    }

    #[test]
    fn test_gtin_duplicates_first_wins() {
        let mut first = candidate(
            "Samsung Galaxy S25 Ultra",
            "https://www.flipkart.com/samsung-galaxy-s25/p/itm1?gtin=8801643711013",
        );
        first.price = Some("₹1,29,999".into());
        let mut second = candidate(
            "Samsung Galaxy S25 Ultra 5G",
            "https://www.croma.com/samsung-galaxy-s25-ultra/p/8801643711013",
        );
        second.price = Some("₹1,27,999".into());
        second.tier = SourceTier::Secondary;

        let out = EcommerceFilter::new().filter(vec![first, second], &classification(Category::MobilePhones, 0.95));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].domain, "flipkart.com");
        assert_eq!(out[0].corroborating_tiers, vec![SourceTier::Secondary]);
    }

    #[test]
    fn test_category_exclusion_both_directions() {
        let mut phone = candidate(
            "Samsung Galaxy S25 Ultra",
            "https://www.amazon.in/dp/B0DSKL9MQ8",
        );
        phone.price = Some("₹1,29,999".into());
        let mut washer = candidate(
            "LG 8 kg Front Load Washing Machine",
            "https://www.croma.com/lg-washing-machine/p/250001",
        );
        washer.price = Some("₹32,990".into());

        let filter = EcommerceFilter::new();
        let home = filter.filter(
            vec![phone.clone(), washer.clone()],
            &classification(Category::HomeAppliances, 0.96),
        );
        assert_eq!(home.len(), 1);
        assert!(home[0].title.contains("Washing"));

        let mobile = filter.filter(vec![phone, washer], &classification(Category::MobilePhones, 0.95));
        assert_eq!(mobile.len(), 1);
        assert!(mobile[0].title.contains("Galaxy"));
    }

    #[test]
    fn test_category_gate_skipped_when_unsure() {
        let mut washer = candidate(
            "LG 8 kg Front Load Washing Machine",
            "https://www.croma.com/lg-washing-machine/p/250001",
        );
        washer.price = Some("₹32,990".into());
        let out = EcommerceFilter::new().filter(vec![washer], &classification(Category::MobilePhones, 0.6));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_informational_page_rejected() {
        let specs = candidate(
            "Samsung Galaxy S25 specifications and comparison",
            "https://www.techsite.com/specs/galaxy-s25",
        );
        let filter = EcommerceFilter::new();
        assert!(filter.signal_score(&specs) < 0);
        assert!(filter.filter(vec![specs], &classification(Category::MobilePhones, 0.95)).is_empty());
    }

    #[test]
    fn test_accessory_penalty_spares_main_products() {
        let filter = EcommerceFilter::new();
        let guard = candidate("Tempered Glass Screen Guard", "https://www.example-shop.com/item/123");
        assert_eq!(filter.signal_score(&guard), -1);

        let bundle = candidate(
            "Samsung Galaxy S25 with charger, 256 GB",
            "https://www.example-shop.com/item/124",
        );
        assert_eq!(filter.signal_score(&bundle), 1);
    }

    #[test]
    fn test_signal_score_rewards_product_pages() {
        let mut listing = candidate(
            "Apple iPhone 15 (128 GB) - Black",
            "https://www.amazon.in/dp/B0CHX1W1XY",
        );
        listing.price = Some("₹69,900".into());
        listing.description = "Add to cart. In stock".into();
        listing.has_structured_data = true;
        listing.image = Some("https://m.media-amazon.com/images/iphone15.jpg".into());
        listing.review_count = Some(1873);

        // price 2, buy 2, id 1, markup 1, availability 1, image 1, url 1, reviews 1
        assert_eq!(EcommerceFilter::new().signal_score(&listing), 10);
    }
}
