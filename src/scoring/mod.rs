//! Relevance scoring
//!
//! Four independent sub-scores per candidate, each in [0, 1], combined with
//! weights that lean towards the semantic signal when the classifier is
//! confident. Output is sorted by relevance, best first.

pub mod attribute;
pub mod cross_modal;
pub mod lexical;
pub mod semantic;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::catalog;
use crate::extract::AttributeExtractor;
use crate::models::clamp01;
use crate::models::Candidate;
use crate::models::CategoryClassification;
use crate::models::NormalizedQuery;
use crate::models::ScoredCandidate;
use crate::models::Scores;

/// Placeholder until click data exists
pub const NEUTRAL_BEHAVIORAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceWeights {
    pub lexical: f64,
    pub semantic: f64,
    pub attribute: f64,
    pub cross_modal: f64,
    /// Classifier confidence above which weight moves to the semantic signal
    pub confident_threshold: f64,
    pub confident_shift: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            lexical: 0.25,
            semantic: 0.35,
            attribute: 0.25,
            cross_modal: 0.15,
            confident_threshold: 0.8,
            confident_shift: 0.1,
        }
    }
}

impl RelevanceWeights {
    /// Weights in effect for a given classifier confidence
    pub fn effective(&self, confidence: f64) -> Self {
        if confidence <= self.confident_threshold {
            return *self;
        }
        let half = self.confident_shift / 2.0;
        Self {
            lexical: (self.lexical - half).max(0.0),
            semantic: self.semantic + self.confident_shift,
            attribute: (self.attribute - half).max(0.0),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    weights: RelevanceWeights,
    extractor: AttributeExtractor,
}

impl RelevanceScorer {
    pub fn new(weights: RelevanceWeights) -> Self {
        Self {
            weights,
            extractor: AttributeExtractor::new(),
        }
    }

    pub fn score(
        &self,
        candidates: Vec<Candidate>,
        query: &NormalizedQuery,
        classification: &CategoryClassification,
    ) -> Vec<ScoredCandidate> {
        let profile = catalog::profile(classification.primary_category);
        let weights = self.weights.effective(classification.confidence);
        let terms = lexical::query_terms(&query.normalized);

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let text = candidate.text().to_lowercase();
                let listing_attrs = self.extractor.extract(&text);

                let lexical = lexical::bm25(&terms, &text);
                let semantic = semantic::semantic_score(profile, &text);
                let attribute = attribute::attribute_score(
                    &query.attributes,
                    query.budget.as_ref(),
                    &listing_attrs,
                    candidate.price.as_deref(),
                );
                let cross_modal = cross_modal::cross_modal_score(profile, &candidate, &text);

                let relevance = clamp01(
                    weights.lexical * lexical
                        + weights.semantic * semantic
                        + weights.attribute * attribute
                        + weights.cross_modal * cross_modal,
                );
                debug!(
                    "'{}': lexical {:.3} semantic {:.3} attribute {:.3} cross-modal {:.3} -> {:.3}",
                    candidate.title, lexical, semantic, attribute, cross_modal, relevance
                );

                ScoredCandidate {
                    candidate,
                    scores: Scores {
                        lexical,
                        semantic,
                        attribute,
                        cross_modal,
                        relevance,
                        behavioral: NEUTRAL_BEHAVIORAL,
                        final_score: relevance,
                        ..Scores::default()
                    },
                }
            })
            .collect();

        scored.sort_by(|a, b| b.scores.relevance.total_cmp(&a.scores.relevance));
        info!("Scored {} candidates for '{}'", scored.len(), query.normalized);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CategoryClassifier;
    use crate::models::Availability;
    use crate::models::SourceTier;
    use crate::query::QueryUnderstanding;

    fn candidate(title: &str, description: &str) -> Candidate {
        Candidate {
            title: title.into(),
            description: description.into(),
            url: "https://www.flipkart.com/p/itm1".into(),
            domain: "flipkart.com".into(),
            image: None,
            price: Some("₹1,29,999".into()),
            rating: None,
            review_count: None,
            availability: Availability::InStock,
            source_provider: "test".into(),
            tier: SourceTier::Primary,
            product_id: None,
            has_structured_data: false,
            corroborating_tiers: Vec::new(),
        }
    }

    #[test]
    fn test_effective_weights_shift_when_confident() {
        let weights = RelevanceWeights::default();
        assert_eq!(weights.effective(0.5), weights);

        let confident = weights.effective(0.95);
        assert!((confident.semantic - 0.45).abs() < 1e-9);
        assert!((confident.lexical - 0.20).abs() < 1e-9);
        assert!((confident.attribute - 0.20).abs() < 1e-9);
        let total = confident.lexical + confident.semantic + confident.attribute + confident.cross_modal;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_matching_listing_ranks_first() {
        let understanding = QueryUnderstanding::new();
        let query = understanding.normalize("samsung galaxy s25").unwrap();
        let classification = CategoryClassifier::default().classify(&query);
        let query = understanding.build_variants(&query, &classification);

        let scored = RelevanceScorer::default().score(
            vec![
                candidate("Samsung Galaxy S24 FE", "Mint, 128 GB"),
                candidate("Samsung Galaxy S25 Ultra 5G smartphone", "Titanium Black, 256 GB, 200 MP camera"),
                candidate("Samsung 8 kg washing machine", "Ecobubble"),
            ],
            &query,
            &classification,
        );

        assert_eq!(scored.len(), 3);
        assert!(scored[0].candidate.title.contains("S25"));
        assert!(scored[2].candidate.title.contains("washing"));
        for s in &scored {
            for value in [s.scores.lexical, s.scores.semantic, s.scores.attribute, s.scores.cross_modal, s.scores.relevance] {
                assert!((0.0..=1.0).contains(&value));
            }
            assert_eq!(s.scores.behavioral, NEUTRAL_BEHAVIORAL);
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let query = QueryUnderstanding::new().normalize("iphone 15 128gb").unwrap();
        let classification = CategoryClassifier::default().classify(&query);
        let listings = vec![
            candidate("Apple iPhone 15 (128 GB) - Black", "In stock"),
            candidate("Apple iPhone 15 Plus (256 GB)", "Blue"),
        ];
        let scorer = RelevanceScorer::default();
        let first = scorer.score(listings.clone(), &query, &classification);
        let second = scorer.score(listings, &query, &classification);
        assert_eq!(first, second);
    }
}
