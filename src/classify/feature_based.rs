//! Weighted feature matching against each category profile
//!
//! Each signal only counts toward the denominator when the query exposes
//! it: a query without a brand cannot miss a brand match. The category
//! score is the share of applicable weight it earned.

use crate::catalog;
use crate::catalog::CategoryProfile;
use crate::classify::Classifier;
use crate::extract::contains_any;
use crate::extract::contains_term;
use crate::models::clamp01;
use crate::models::CategoryScore;
use crate::models::ClassificationMethod;
use crate::models::MethodResult;
use crate::models::NormalizedQuery;

const BRAND_WEIGHT: f64 = 0.3;
const MODEL_PATTERN_WEIGHT: f64 = 0.25;
const KEYWORD_WEIGHT: f64 = 0.2;
const PRICE_WEIGHT: f64 = 0.1;
const FEATURE_WEIGHT: f64 = 0.15;

/// Alternatives reported besides the winner
const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBasedClassifier;

impl FeatureBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    fn model_pattern_matches(profile: &CategoryProfile, query: &NormalizedQuery, brand: &str) -> bool {
        let attrs = &query.attributes;
        let series_model = [attrs.series.as_deref(), attrs.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        profile.patterns_for(brand).iter().any(|pattern| {
            (!series_model.is_empty() && series_model.starts_with(pattern))
                || attrs.series.as_deref() == Some(*pattern)
                || contains_term(&query.normalized, pattern)
        })
    }

    fn feature_hit(profile: &CategoryProfile, query: &NormalizedQuery) -> bool {
        if contains_any(&query.normalized, profile.features) {
            return true;
        }
        // "camera_quality" is about the camera, not quality in general
        query.features.iter().any(|feature| {
            feature
                .name
                .split('_')
                .next()
                .is_some_and(|head| profile.features.iter().any(|f| contains_term(f, head)))
        })
    }

    /// Score one category, returning the earned share and the signals that fired
    fn score_profile(
        profile: &CategoryProfile,
        query: &NormalizedQuery,
        features_applicable: bool,
    ) -> (f64, Vec<&'static str>) {
        let attrs = &query.attributes;
        let mut applicable = KEYWORD_WEIGHT;
        let mut earned = 0.0;
        let mut reasons = Vec::new();

        if let Some(brand) = attrs.brand.as_deref() {
            applicable += BRAND_WEIGHT;
            if profile.brands.contains(&brand) {
                earned += BRAND_WEIGHT;
                reasons.push("brand");
            }
            if attrs.series.is_some() || attrs.model.is_some() {
                applicable += MODEL_PATTERN_WEIGHT;
                if Self::model_pattern_matches(profile, query, brand) {
                    earned += MODEL_PATTERN_WEIGHT;
                    reasons.push("model pattern");
                }
            }
        }

        if contains_any(&query.normalized, profile.keywords) {
            earned += KEYWORD_WEIGHT;
            reasons.push("keyword");
        }

        if let Some(price) = query.budget.as_ref().and_then(|b| b.reference_price()) {
            applicable += PRICE_WEIGHT;
            let (low, high) = profile.budget_window;
            if (low..=high).contains(&price) {
                earned += PRICE_WEIGHT;
                reasons.push("price range");
            }
        }

        if features_applicable {
            applicable += FEATURE_WEIGHT;
            if Self::feature_hit(profile, query) {
                earned += FEATURE_WEIGHT;
                reasons.push("features");
            }
        }

        (clamp01(earned / applicable), reasons)
    }
}

impl Classifier for FeatureBasedClassifier {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::FeatureBased
    }

    fn classify(&self, query: &NormalizedQuery) -> Option<MethodResult> {
        // Feature weight applies to every category once any of them can earn it
        let features_applicable = !query.features.is_empty()
            || catalog::profiles().any(|profile| Self::feature_hit(profile, query));

        let mut scores: Vec<CategoryScore> = catalog::profiles()
            .map(|profile| {
                let (score, reasons) = Self::score_profile(profile, query, features_applicable);
                CategoryScore {
                    category: profile.category,
                    score,
                    confidence: score,
                    reason: if reasons.is_empty() {
                        "no matching features".to_string()
                    } else {
                        format!("matched {}", reasons.join(", "))
                    },
                }
            })
            .collect();

        // Stable sort keeps declaration order on ties
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        if scores.first().map_or(true, |s| s.score <= 0.0) {
            return None;
        }

        let primary = scores.remove(0);
        let alternatives = scores
            .into_iter()
            .filter(|s| s.score > 0.0)
            .take(MAX_ALTERNATIVES)
            .collect();

        Some(MethodResult {
            method: self.method(),
            primary,
            alternatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::query::QueryUnderstanding;

    fn classify(text: &str) -> Option<MethodResult> {
        let query = QueryUnderstanding::new().normalize(text).unwrap();
        FeatureBasedClassifier::new().classify(&query)
    }

    #[test]
    fn test_full_match_for_specific_model() {
        let result = classify("samsung galaxy s25").unwrap();
        assert_eq!(result.primary.category, Category::MobilePhones);
        assert_eq!(result.primary.score, 1.0);
        assert!(result.primary.reason.contains("model pattern"));
        // Samsung also sells appliances, so other categories keep the brand share
        assert_eq!(result.alternatives.len(), 2);
        assert!(result.alternatives.iter().all(|a| a.score < result.primary.score));
    }

    #[test]
    fn test_generic_keyword_query() {
        let result = classify("washing machine").unwrap();
        assert_eq!(result.primary.category, Category::HomeAppliances);
        assert_eq!(result.primary.score, 1.0);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_budget_and_feature_signals() {
        let result = classify("under 50k camera phone").unwrap();
        assert_eq!(result.primary.category, Category::MobilePhones);
        assert!(result.primary.reason.contains("price range"));
        assert!(result.primary.reason.contains("features"));
    }

    #[test]
    fn test_no_signal_returns_none() {
        assert!(classify("gift ideas").is_none());
    }
}
