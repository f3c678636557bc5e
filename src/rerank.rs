//! Strict re-filter and rank fusion
//!
//! Runs after relevance scoring. Survivors of the category, brand/model and
//! specification checks are fused across source tiers with reciprocal rank
//! fusion and blended with a business score. If the checks would leave
//! nothing, the scored input comes back with neutral fused scores instead
//! of an empty page.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::catalog;
use crate::catalog::domain_in;
use crate::catalog::domain_matches;
use crate::catalog::CategoryProfile;
use crate::catalog::PriceBand;
use crate::extract::contains_any;
use crate::extract::models_match;
use crate::extract::parse_price;
use crate::extract::AttributeExtractor;
use crate::models::clamp01;
use crate::models::Availability;
use crate::models::Candidate;
use crate::models::CategoryClassification;
use crate::models::NormalizedQuery;
use crate::models::ScoredCandidate;
use crate::models::SourceTier;

/// Score given to rrf, business and final when the re-filter empties the list
pub const NEUTRAL_SCORE: f64 = 0.5;

/// The category re-filter runs above this classifier confidence; the neutral fallback verdict sits exactly on it
const CATEGORY_REFILTER_CONFIDENCE: f64 = 0.5;

/// Review count at which the review signal saturates
const REVIEW_SATURATION: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub primary: f64,
    pub secondary: f64,
    pub tertiary: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            primary: 1.0,
            secondary: 0.8,
            tertiary: 0.6,
        }
    }
}

impl TierWeights {
    pub fn weight(&self, tier: SourceTier) -> f64 {
        match tier {
            SourceTier::Primary => self.primary,
            SourceTier::Secondary => self.secondary,
            SourceTier::Tertiary => self.tertiary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessWeights {
    pub reputation: f64,
    pub availability: f64,
    pub price: f64,
    pub rating: f64,
    pub reviews: f64,
}

impl Default for BusinessWeights {
    fn default() -> Self {
        Self {
            reputation: 0.25,
            availability: 0.20,
            price: 0.25,
            rating: 0.15,
            reviews: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub rrf_k: f64,
    pub tier_weights: TierWeights,
    pub business: BusinessWeights,
    pub rrf_weight: f64,
    pub business_weight: f64,
    /// Reputation bonus for retailers serving the default region
    pub regional_bonus: f64,
    pub unknown_seller_reputation: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            tier_weights: TierWeights::default(),
            business: BusinessWeights::default(),
            rrf_weight: 0.6,
            business_weight: 0.4,
            regional_bonus: 0.1,
            unknown_seller_reputation: 0.5,
        }
    }
}

/// Price reasonableness against a category band
///
/// Unpriced listings are neutral, prices outside the hard bounds score 0.2,
/// and inside the band the score falls with distance from the sweet spot
/// but never below 0.3.
pub fn price_score(price: Option<&str>, band: &PriceBand) -> f64 {
    let Some(value) = price.and_then(parse_price) else {
        return NEUTRAL_SCORE;
    };
    if value < band.min || value > band.max {
        return 0.2;
    }
    let span = band.max - band.min;
    if span <= 0.0 {
        return 1.0;
    }
    (1.0 - (value - band.optimal).abs() / span).max(0.3)
}

pub fn availability_score(availability: Availability) -> f64 {
    match availability {
        Availability::InStock => 1.0,
        Availability::OutOfStock => 0.0,
        Availability::Unknown => NEUTRAL_SCORE,
    }
}

pub fn review_score(reviews: Option<u64>) -> f64 {
    reviews.map_or(NEUTRAL_SCORE, |n| clamp01(((n as f64) + 1.0).log10() / (REVIEW_SATURATION + 1.0).log10()))
}

#[derive(Debug, Clone, Default)]
pub struct AdvancedFilterAndFuse {
    config: FusionConfig,
    extractor: AttributeExtractor,
}

impl AdvancedFilterAndFuse {
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config,
            extractor: AttributeExtractor::new(),
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Input is expected in relevance order; output is sorted by final score
    pub fn finalize(
        &self,
        scored: Vec<ScoredCandidate>,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
    ) -> Vec<ScoredCandidate> {
        if scored.is_empty() {
            return scored;
        }
        let profile = catalog::profile(classification.primary_category);
        let input = scored.len();

        let (survivors, rejected): (Vec<ScoredCandidate>, Vec<ScoredCandidate>) = scored
            .into_iter()
            .partition(|s| self.passes(&s.candidate, query, classification, profile));

        if survivors.is_empty() {
            warn!(
                "Re-filter removed all {} candidates for '{}'; returning them with neutral scores",
                input, query.normalized
            );
            return rejected
                .into_iter()
                .map(|mut s| {
                    s.scores.rrf = NEUTRAL_SCORE;
                    s.scores.business = NEUTRAL_SCORE;
                    s.scores.final_score = NEUTRAL_SCORE;
                    s
                })
                .collect();
        }

        let rrf = self.rrf_scores(&survivors);
        let mut fused: Vec<ScoredCandidate> = survivors
            .into_iter()
            .zip(rrf)
            .map(|(mut s, rrf)| {
                let business = self.business_score(&s.candidate, &profile.price_band);
                s.scores.rrf = rrf;
                s.scores.business = business;
                s.scores.final_score =
                    clamp01(self.config.rrf_weight * rrf + self.config.business_weight * business);
                s
            })
            .collect();

        fused.sort_by(|a, b| {
            b.scores
                .final_score
                .total_cmp(&a.scores.final_score)
                .then_with(|| b.scores.relevance.total_cmp(&a.scores.relevance))
        });
        info!("Fused {} of {} candidates", fused.len(), input);
        fused
    }

    fn passes(
        &self,
        candidate: &Candidate,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
        profile: &CategoryProfile,
    ) -> bool {
        let text = candidate.text().to_lowercase();

        if classification.confidence > CATEGORY_REFILTER_CONFIDENCE {
            let in_category = contains_any(&text, profile.inclusion) || contains_any(&text, profile.brands);
            if !in_category || contains_any(&text, profile.exclusion) {
                debug!("Category re-filter dropped '{}'", candidate.title);
                return false;
            }
        }

        let listing = self.extractor.extract(&text);
        let wanted = &query.attributes;

        if let (Some(a), Some(b)) = (wanted.brand.as_deref(), listing.brand.as_deref()) {
            if a != b {
                debug!("Brand re-filter dropped '{}' ({} != {})", candidate.title, b, a);
                return false;
            }
        }
        if let (Some(a), Some(b)) = (wanted.model.as_deref(), listing.model.as_deref()) {
            if !models_match(a, b) {
                debug!("Model re-filter dropped '{}' ({} vs {})", candidate.title, b, a);
                return false;
            }
        }
        if let (Some(a), Some(b)) = (wanted.storage.as_ref(), listing.storage.as_ref()) {
            if (a.gigabytes() - b.gigabytes()).abs() > f64::EPSILON {
                debug!("Specification re-filter dropped '{}'", candidate.title);
                return false;
            }
        }
        true
    }

    /// Per-candidate fused rank score, scaled so rank one in a weight-1 tier is 1.0
    fn rrf_scores(&self, survivors: &[ScoredCandidate]) -> Vec<f64> {
        let k = self.config.rrf_k;
        let mut next_rank: HashMap<SourceTier, usize> = HashMap::new();
        let mut raw = vec![0.0; survivors.len()];

        for (index, scored) in survivors.iter().enumerate() {
            for tier in scored.candidate.tiers() {
                let rank = next_rank.entry(tier).or_insert(0);
                *rank += 1;
                raw[index] += self.config.tier_weights.weight(tier) / (k + *rank as f64);
            }
        }
        raw.into_iter().map(|r| clamp01(r * (k + 1.0))).collect()
    }

    pub fn seller_reputation(&self, domain: &str) -> f64 {
        let base = catalog::SELLER_REPUTATION
            .iter()
            .find(|(seller, _)| domain_matches(domain, seller))
            .map_or(self.config.unknown_seller_reputation, |(_, score)| *score);
        let bonus = if domain_in(domain, catalog::REGIONAL_RETAILERS) {
            self.config.regional_bonus
        } else {
            0.0
        };
        clamp01(base + bonus)
    }

    pub fn business_score(&self, candidate: &Candidate, band: &PriceBand) -> f64 {
        let w = &self.config.business;
        let rating = candidate.rating.map_or(NEUTRAL_SCORE, |r| clamp01(r / 5.0));
        clamp01(
            w.reputation * self.seller_reputation(&candidate.domain)
                + w.availability * availability_score(candidate.availability)
                + w.price * price_score(candidate.price.as_deref(), band)
                + w.rating * rating
                + w.reviews * review_score(candidate.review_count),
        )
    }
}
