//! Query understanding
//!
//! Two phases. `extract_attributes` normalizes the raw text and pulls out
//! everything that does not depend on the category; `build_variants`
//! runs once the classifier has decided and returns a rebuilt query with
//! the category-specific variant and the category confidence bonus.

pub mod needs;
pub mod normalize;

use tracing::debug;

use crate::catalog;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::extract::contains_any;
use crate::extract::contains_term;
use crate::extract::find_term;
use crate::extract::AttributeExtractor;
use crate::models::CategoryClassification;
use crate::models::Intent;
use crate::models::IntentClassification;
use crate::models::NormalizedQuery;
use crate::models::ProductAttributes;

const COMPARISON_TERMS: &[&str] = &["vs", "versus", "compare", "comparison", "difference between"];

/// Category keywords appended to the category-specific variant
const CATEGORY_VARIANT_TERMS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct QueryUnderstanding {
    extractor: AttributeExtractor,
}

impl QueryUnderstanding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-phase entry point; the result has no category-specific variant yet
    pub fn normalize(&self, raw: &str) -> Result<NormalizedQuery> {
        self.extract_attributes(raw)
    }

    /// Phase one: normalize text, extract attributes, intent, needs and two variants
    pub fn extract_attributes(&self, raw: &str) -> Result<NormalizedQuery> {
        if raw.trim().is_empty() {
            return Err(ShopRankError::InvalidQuery("Search query is required".to_string()));
        }

        let normalized = normalize::normalize_text(raw);
        let attributes = self.extractor.extract(&normalized);
        let intent = classify_intent(&normalized, &attributes);
        let exact_match_variant = exact_match_variant(&normalized, &attributes);
        let expanded_variant = expanded_variant(&normalized, &attributes);

        let query = NormalizedQuery {
            original: raw.to_string(),
            confidence: base_confidence(&attributes, intent.intent),
            budget: needs::extract_budget(&normalized),
            features: needs::extract_features(&normalized),
            quality_levels: needs::extract_quality_levels(&normalized),
            use_case: needs::extract_use_case(&normalized),
            normalized,
            exact_match_variant,
            expanded_variant,
            category_specific_variant: None,
            attributes,
            intent,
        };

        debug!(
            "Normalized '{}' -> '{}' (intent {:?}, confidence {:.2})",
            query.original, query.normalized, query.intent.intent, query.confidence
        );
        Ok(query)
    }

    /// Phase two: rebuild the query with the category-specific variant
    pub fn build_variants(
        &self,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
    ) -> NormalizedQuery {
        let profile = catalog::profile(classification.primary_category);
        let extra: Vec<&str> = profile
            .keywords
            .iter()
            .filter(|k| !contains_term(&query.normalized, k))
            .take(CATEGORY_VARIANT_TERMS)
            .copied()
            .collect();
        let category_variant = if extra.is_empty() {
            query.normalized.clone()
        } else {
            format!("{} {}", query.normalized, extra.join(" "))
        };

        let mut confidence = base_confidence(&query.attributes, query.intent.intent);
        if classification.confidence > 0.8 {
            confidence += 0.1;
        }
        if classification.confidence > 0.9 {
            confidence += 0.1;
        }

        NormalizedQuery {
            category_specific_variant: Some(category_variant),
            confidence: confidence.min(1.0),
            ..query.clone()
        }
    }
}

/// Intent in priority order; the first matching rule wins
pub fn classify_intent(text: &str, attrs: &ProductAttributes) -> IntentClassification {
    let (intent, confidence) = if attrs.brand.is_some() && attrs.model.is_some() {
        (Intent::SpecificModel, 0.9)
    } else if COMPARISON_TERMS.iter().any(|t| find_term(text, t).is_some()) {
        (Intent::Comparison, 0.85)
    } else if catalog::profiles().any(|p| contains_any(text, p.keywords)) {
        (Intent::CategoryBrowsing, 0.7)
    } else if attrs.brand.is_some() {
        (Intent::BrandExploration, 0.75)
    } else {
        (Intent::General, 0.5)
    };
    IntentClassification { intent, confidence }
}

/// Confidence from extracted structure alone, before any category bonus
fn base_confidence(attrs: &ProductAttributes, intent: Intent) -> f64 {
    let mut confidence: f64 = 0.5;
    if attrs.brand.is_some() {
        confidence += 0.1;
    }
    if attrs.model.is_some() {
        confidence += 0.2;
    }
    if attrs.series.is_some() {
        confidence += 0.1;
    }
    if attrs.storage.is_some() {
        confidence += 0.05;
    }
    if attrs.color.is_some() {
        confidence += 0.05;
    }
    if intent == Intent::SpecificModel {
        confidence += 0.2;
    }
    confidence.min(1.0)
}

fn storage_token(attrs: &ProductAttributes) -> Option<String> {
    attrs
        .storage
        .as_ref()
        .map(|s| format!("{}{}", s.value, s.unit))
}

/// Quoted brand and model with accessory exclusions appended
fn exact_match_variant(normalized: &str, attrs: &ProductAttributes) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(brand) = &attrs.brand {
        let core: Vec<&str> = [
            Some(brand.as_str()),
            attrs.series.as_deref(),
            attrs.model.as_deref(),
            attrs.variant.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        parts.push(format!("\"{}\"", core.join(" ")));
        parts.extend(storage_token(attrs));
        parts.extend(attrs.color.clone());
    } else {
        parts.push(normalized.to_string());
    }

    // An explicit accessory search keeps its own word
    for term in catalog::ACCESSORY_EXCLUSIONS {
        if !contains_term(normalized, term) {
            parts.push(format!("-{term}"));
        }
    }
    parts.join(" ")
}

/// Original text plus synonyms and brand aliases not already present
fn expanded_variant(normalized: &str, attrs: &ProductAttributes) -> String {
    let mut extra: Vec<&'static str> = Vec::new();
    let push = |term: &'static str, extra: &mut Vec<&'static str>| {
        if !contains_term(normalized, term) && !extra.contains(&term) {
            extra.push(term);
        }
    };

    for (word, synonyms) in catalog::SYNONYMS {
        if contains_term(normalized, word) {
            for synonym in *synonyms {
                push(*synonym, &mut extra);
            }
        }
    }

    if let Some(brand) = attrs.brand.as_deref().and_then(catalog::brand) {
        push(brand.name, &mut extra);
        if let Some(alias) = brand.aliases.first() {
            push(*alias, &mut extra);
        }
    }

    if extra.is_empty() {
        normalized.to_string()
    } else {
        format!("{} {}", normalized, extra.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetType;
    use crate::models::Category;
    use crate::models::FeaturePriority;
    use crate::models::Uncertainty;

    fn qu() -> QueryUnderstanding {
        QueryUnderstanding::new()
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
    fn test_empty_query_rejected() {
        assert!(matches!(qu().normalize(""), Err(ShopRankError::InvalidQuery(_))));
        assert!(matches!(qu().normalize("   \t\n"), Err(ShopRankError::InvalidQuery(_))));
    }

    #[test]
    fn test_samsung_galaxy_s25_attributes() {
        let q = qu().normalize("samsung galaxy s25").unwrap();
        assert_eq!(q.attributes.brand.as_deref(), Some("samsung"));
        assert_eq!(q.attributes.series.as_deref(), Some("galaxy"));
        assert_eq!(q.attributes.model.as_deref(), Some("s25"));
        assert_eq!(q.intent.intent, Intent::SpecificModel);
        // 0.5 + brand 0.1 + model 0.2 + series 0.1 + specific model 0.2, capped
        assert_eq!(q.confidence, 1.0);
    }

    #[test]
    fn test_under_50k_camera_phone_budget() {
        let q = qu().normalize("under 50k camera phone").unwrap();
        let budget = q.budget.as_ref().unwrap();
        assert_eq!(budget.kind, BudgetType::Max);
        assert_eq!(budget.max, Some(50000.0));
        assert!(!q.has_feature("camera_quality"));
    }

    #[test]
    fn test_good_camera_phrasing_sets_essential_feature() {
        let q = qu().normalize("phone with good camera under 50k").unwrap();
        let feature = q.features.iter().find(|f| f.name == "camera_quality").unwrap();
        assert_eq!(feature.priority, FeaturePriority::Essential);
        assert_eq!(q.budget.unwrap().max, Some(50000.0));
    }

    #[test]
    fn test_intent_priority_order() {
        let q = qu().normalize("iphone 15 vs samsung galaxy s24").unwrap();
        assert_eq!(q.intent.intent, Intent::SpecificModel);

        let q = qu().normalize("compare phones").unwrap();
        assert_eq!(q.intent.intent, Intent::Comparison);

        let q = qu().normalize("washing machines").unwrap();
        assert_eq!(q.intent.intent, Intent::CategoryBrowsing);
        assert_eq!(q.normalized, "washing machine");

        let q = qu().normalize("samsung").unwrap();
        assert_eq!(q.intent.intent, Intent::BrandExploration);

        let q = qu().normalize("gift ideas").unwrap();
        assert_eq!(q.intent.intent, Intent::General);
        assert_eq!(q.confidence, 0.5);
    }

    #[test]
    fn test_exact_match_variant() {
        let q = qu().normalize("Samsung Galaxy S25 Ultra 256GB").unwrap();
        assert!(q.exact_match_variant.starts_with("\"samsung galaxy s25 ultra\""));
        assert!(q.exact_match_variant.contains("256gb"));
        assert!(q.exact_match_variant.contains("-case"));
        assert!(q.exact_match_variant.contains("-charger"));
    }

    #[test]
    fn test_exact_match_keeps_requested_accessory() {
        let q = qu().normalize("iphone 15 case").unwrap();
        assert!(!q.exact_match_variant.contains("-case"));
        assert!(q.exact_match_variant.contains("-cover"));
    }

    #[test]
    fn test_expanded_variant_adds_synonyms_and_brand() {
        let q = qu().normalize("iphone 15 phone").unwrap();
        assert!(q.expanded_variant.contains("smartphone"));
        assert!(q.expanded_variant.contains("apple"));
        assert!(q.expanded_variant.starts_with("iphone 15 phone"));
    }

    #[test]
    fn test_build_variants_is_a_rebuild() {
        let understanding = qu();
        let q = understanding.normalize("washing machine").unwrap();
        let before = q.clone();
        let built = understanding.build_variants(&q, &classification(Category::HomeAppliances, 0.95));

        assert_eq!(q, before);
        let variant = built.category_specific_variant.as_deref().unwrap();
        assert!(variant.starts_with("washing machine "));
        assert!(variant.contains("refrigerator"));
        assert!((built.confidence - (q.confidence + 0.2)).abs() < 1e-9);

        // Building twice does not stack the bonus
        let again = understanding.build_variants(&built, &classification(Category::HomeAppliances, 0.95));
        assert_eq!(again.confidence, built.confidence);
    }

    #[test]
    fn test_retrieval_text_falls_back_to_normalized() {
        let q = qu().normalize("gift ideas").unwrap();
        assert_eq!(q.retrieval_text(), "gift ideas");
    }
}
