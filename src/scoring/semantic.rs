//! Keyword-proxy semantic similarity
//!
//! Stands in for embedding similarity: overlap with the category's primary
//! and secondary vocabularies, minus hits on words owned by other categories.

use crate::catalog::CategoryProfile;
use crate::extract::count_terms;
use crate::models::clamp01;

const PRIMARY_WEIGHT: f64 = 0.7;
const SECONDARY_WEIGHT: f64 = 0.3;
const EXCLUSION_PENALTY: f64 = 0.2;

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64).min(1.0)
    }
}

/// Share of the primary vocabulary present in the listing alone
pub fn primary_ratio(profile: &CategoryProfile, text: &str) -> f64 {
    ratio(count_terms(text, profile.semantic_primary), profile.semantic_primary.len())
}

/// `text` must already be lowercased
pub fn semantic_score(profile: &CategoryProfile, text: &str) -> f64 {
    let primary = primary_ratio(profile, text);
    let secondary = ratio(count_terms(text, profile.semantic_secondary), profile.semantic_secondary.len());
    let exclusions = count_terms(text, profile.exclusion) as f64;

    clamp01(PRIMARY_WEIGHT * primary + SECONDARY_WEIGHT * secondary - EXCLUSION_PENALTY * exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::profile;
    use crate::models::Category;

    #[test]
    fn test_semantic_prefers_in_category_listings() {
        let mobile = profile(Category::MobilePhones);
        let phone = semantic_score(mobile, "samsung galaxy s25 smartphone 200mp camera 5000mah battery");
        let washer = semantic_score(mobile, "lg washing machine 8 kg");
        assert!(phone > washer);
        assert!((0.0..=1.0).contains(&phone));
    }

    #[test]
    fn test_unrelated_listing_scores_zero() {
        let appliances = profile(Category::HomeAppliances);
        assert_eq!(semantic_score(appliances, "bluetooth speaker with deep bass"), 0.0);
    }

    #[test]
    fn test_exclusion_hits_subtract() {
        let mobile = profile(Category::MobilePhones);
        let clean = semantic_score(mobile, "smartphone mobile phone galaxy iphone pixel");
        let polluted = semantic_score(mobile, "smartphone mobile phone galaxy iphone pixel tablet laptop");
        assert!((clean - polluted - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_primary_ratio_bounds() {
        let mobile = profile(Category::MobilePhones);
        assert_eq!(primary_ratio(mobile, "nothing relevant"), 0.0);
        assert!(primary_ratio(mobile, "smartphone mobile phone cell galaxy iphone pixel") <= 1.0);
    }
}
