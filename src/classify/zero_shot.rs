//! Keyword-overlap stand-in for zero-shot classification
//!
//! Compares the query against each category's description and keyword
//! table. No model is involved; scores stay deterministic.

use crate::catalog;
use crate::catalog::CategoryProfile;
use crate::classify::Classifier;
use crate::extract::contains_term;
use crate::extract::count_terms;
use crate::extract::tokenize;
use crate::models::clamp01;
use crate::models::CategoryScore;
use crate::models::ClassificationMethod;
use crate::models::MethodResult;
use crate::models::NormalizedQuery;

const KEYWORD_HIT: f64 = 0.3;
const BRAND_HIT: f64 = 0.4;
const DESCRIPTION_WEIGHT: f64 = 0.3;

const MAX_ALTERNATIVES: usize = 3;

/// Words that carry no category signal
const FILLER: &[&str] = &[
    "max", "target", "range", "to", "thousand", "lakh", "need", "with", "for", "a", "an", "the",
    "and", "or", "best", "good", "new", "buy",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroShotClassifier;

impl ZeroShotClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Share of meaningful query words found in the category description
    fn description_overlap(profile: &CategoryProfile, words: &[String]) -> f64 {
        if words.is_empty() {
            return 0.0;
        }
        let hits = words
            .iter()
            .filter(|w| contains_term(profile.description, w))
            .count();
        hits as f64 / words.len() as f64
    }

    fn similarity(profile: &CategoryProfile, query: &NormalizedQuery, words: &[String]) -> f64 {
        let mut score = KEYWORD_HIT * count_terms(&query.normalized, profile.keywords) as f64;
        if query
            .attributes
            .brand
            .as_deref()
            .is_some_and(|b| profile.brands.contains(&b))
        {
            score += BRAND_HIT;
        }
        score += DESCRIPTION_WEIGHT * Self::description_overlap(profile, words);
        clamp01(score)
    }
}

impl Classifier for ZeroShotClassifier {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::ZeroShot
    }

    fn classify(&self, query: &NormalizedQuery) -> Option<MethodResult> {
        let words: Vec<String> = tokenize(&query.normalized)
            .into_iter()
            .filter(|w| w.len() > 1 && !w.chars().any(|c| c.is_ascii_digit()))
            .filter(|w| !FILLER.contains(&w.as_str()))
            .collect();

        let mut scores: Vec<CategoryScore> = catalog::profiles()
            .map(|profile| {
                let score = Self::similarity(profile, query, &words);
                CategoryScore {
                    category: profile.category,
                    score,
                    confidence: score,
                    reason: format!("similarity to '{}'", profile.category),
                }
            })
            .filter(|s| s.score > 0.0)
            .collect();

        if scores.is_empty() {
            return None;
        }
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        let primary = scores.remove(0);
        scores.truncate(MAX_ALTERNATIVES);

        Some(MethodResult {
            method: self.method(),
            primary,
            alternatives: scores,
        })
    }
}
