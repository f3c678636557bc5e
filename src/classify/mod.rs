//! Category classification
//!
//! Three independent methods vote; `CategoryClassifier` combines their
//! output with fixed method weights into one verdict.

pub mod feature_based;
pub mod rule_based;
pub mod zero_shot;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

pub use feature_based::FeatureBasedClassifier;
pub use rule_based::RuleBasedClassifier;
pub use zero_shot::ZeroShotClassifier;

use crate::models::clamp01;
use crate::models::AlternativeCategory;
use crate::models::Category;
use crate::models::CategoryClassification;
use crate::models::ClassificationMethod;
use crate::models::MethodResult;
use crate::models::NormalizedQuery;
use crate::models::Uncertainty;

/// One classification method
pub trait Classifier: Send + Sync {
    fn method(&self) -> ClassificationMethod;

    /// `None` when the method has no opinion about this query
    fn classify(&self, query: &NormalizedQuery) -> Option<MethodResult>;
}

/// Share of the ensemble each method carries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub rule_based: f64,
    pub feature_based: f64,
    pub zero_shot: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            rule_based: 0.4,
            feature_based: 0.35,
            zero_shot: 0.25,
        }
    }
}

/// Alternatives contribute at half their method's weight
const ALTERNATIVE_FACTOR: f64 = 0.5;
const AGREEMENT_BONUS: f64 = 0.1;
const AMBIGUITY_PENALTY: f64 = 0.1;
const AMBIGUITY_GAP: f64 = 0.2;

#[derive(Debug, Clone)]
struct Tally {
    category: Category,
    score: f64,
    nominated_by: Vec<ClassificationMethod>,
}

pub struct CategoryClassifier {
    methods: Vec<(Box<dyn Classifier>, f64)>,
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(EnsembleWeights::default())
    }
}

impl CategoryClassifier {
    pub fn new(weights: EnsembleWeights) -> Self {
        Self {
            methods: vec![
                (Box::new(RuleBasedClassifier::default()), weights.rule_based),
                (Box::new(FeatureBasedClassifier::new()), weights.feature_based),
                (Box::new(ZeroShotClassifier::new()), weights.zero_shot),
            ],
        }
    }

    /// Ensemble over an arbitrary set of weighted methods
    pub fn with_methods(methods: Vec<(Box<dyn Classifier>, f64)>) -> Self {
        Self { methods }
    }

    pub fn classify(&self, query: &NormalizedQuery) -> CategoryClassification {
        let results: Vec<(MethodResult, f64)> = self
            .methods
            .iter()
            .filter_map(|(method, weight)| method.classify(query).map(|r| (r, *weight)))
            .collect();

        if results.is_empty() {
            warn!("No classifier produced a result for '{}', using fallback", query.normalized);
            return CategoryClassification::fallback();
        }

        let mut tallies: Vec<Tally> = Category::ALL
            .iter()
            .map(|category| Tally {
                category: *category,
                score: 0.0,
                nominated_by: Vec::new(),
            })
            .collect();

        for (result, weight) in &results {
            let nominations = std::iter::once((&result.primary, 1.0)).chain(
                result
                    .alternatives
                    .iter()
                    .map(|alt| (alt, ALTERNATIVE_FACTOR)),
            );
            for (score, factor) in nominations {
                if let Some(tally) = tallies.iter_mut().find(|t| t.category == score.category) {
                    tally.score += clamp01(score.score) * weight * factor;
                    if !tally.nominated_by.contains(&result.method) {
                        tally.nominated_by.push(result.method);
                    }
                }
            }
        }

        tallies.retain(|t| t.score > 0.0);
        tallies.sort_by(|a, b| b.score.total_cmp(&a.score));

        let Some(top) = tallies.first().cloned() else {
            warn!("Classifier scores were all zero for '{}', using fallback", query.normalized);
            return CategoryClassification::fallback();
        };
        let runner_up = tallies.get(1).map_or(0.0, |t| t.score);

        let contributing_methods: Vec<ClassificationMethod> = results
            .iter()
            .filter(|(r, _)| r.primary.category == top.category)
            .map(|(r, _)| r.method)
            .collect();

        let mut confidence = top.score;
        if contributing_methods.len() >= 2 {
            confidence += AGREEMENT_BONUS;
        }
        if tallies.len() > 1 && top.score - runner_up < AMBIGUITY_GAP {
            confidence -= AMBIGUITY_PENALTY;
        }
        let confidence = clamp01(confidence);

        let alternatives = tallies
            .iter()
            .skip(1)
            .map(|t| AlternativeCategory {
                category: t.category,
                confidence: clamp01(t.score).min(confidence),
                reason: format!(
                    "suggested by {}",
                    t.nominated_by
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
            .collect();

        let classification = CategoryClassification {
            primary_category: top.category,
            confidence,
            score: clamp01(top.score),
            alternatives,
            contributing_methods,
            uncertainty: uncertainty(top.score - runner_up),
        };

        debug!(
            "Classified '{}' as {} (confidence {:.2}, {:?} uncertainty)",
            query.normalized,
            classification.primary_category,
            classification.confidence,
            classification.uncertainty
        );
        classification
    }

    /// Classification when the caller already named a category
    ///
    /// The ensemble still runs so alternatives stay informative.
    pub fn classify_with_hint(&self, query: &NormalizedQuery, hint: Category) -> CategoryClassification {
        let ensemble = self.classify(query);
        let alternatives = ensemble
            .alternatives
            .into_iter()
            .chain(std::iter::once(AlternativeCategory {
                category: ensemble.primary_category,
                confidence: ensemble.confidence,
                reason: "ensemble primary".to_string(),
            }))
            .filter(|alt| alt.category != hint)
            .collect();

        CategoryClassification {
            primary_category: hint,
            confidence: 1.0,
            score: 1.0,
            alternatives,
            contributing_methods: Vec::new(),
            uncertainty: Uncertainty::Low,
        }
    }
}

fn uncertainty(gap: f64) -> Uncertainty {
    if gap < 0.1 {
        Uncertainty::High
    } else if gap < 0.3 {
        Uncertainty::Medium
    } else {
        Uncertainty::Low
    }
}
