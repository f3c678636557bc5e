//! BM25 term scoring against a single listing

use crate::extract::tokenize;
use crate::models::clamp01;

pub const K1: f64 = 1.2;
pub const B: f64 = 0.75;
/// Listings are short; there is no corpus to measure this from
pub const AVG_DOC_LEN: f64 = 50.0;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "for", "with", "in", "on", "of", "to", "under", "below",
    "above", "best", "good", "need", "buy", "online", "price",
];

/// Query terms worth matching, in order and without repeats
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if !STOPWORDS.contains(&token.as_str()) && !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Mean per-term BM25 saturation, each term normalized by `K1 + 1`
///
/// There is no collection to derive IDF from, so every term weighs the same.
pub fn bm25(terms: &[String], document: &str) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let tokens = tokenize(document);
    if tokens.is_empty() {
        return 0.0;
    }
    let doc_len = tokens.len() as f64;
    let norm = K1 * (1.0 - B + B * doc_len / AVG_DOC_LEN);

    let total: f64 = terms
        .iter()
        .map(|term| {
            let tf = tokens.iter().filter(|t| *t == term).count() as f64;
            tf * (K1 + 1.0) / (tf + norm) / (K1 + 1.0)
        })
        .sum();
    clamp01(total / terms.len() as f64)
}
