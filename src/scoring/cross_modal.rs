//! Image, text and category agreement for one listing

use crate::catalog::CategoryProfile;
use crate::extract::contains_any;
use crate::models::clamp01;
use crate::models::Candidate;
use crate::scoring::semantic::primary_ratio;

const IMAGE_BONUS: f64 = 0.3;
const SPEC_BONUS: f64 = 0.2;
const CATEGORY_WEIGHT: f64 = 0.5;

/// Does the listing look like one product type across its image URL, specs and wording
pub fn cross_modal_score(profile: &CategoryProfile, candidate: &Candidate, text: &str) -> f64 {
    let mut score = 0.0;

    if let Some(image) = candidate.image.as_deref() {
        let image = image.to_lowercase();
        if profile.image_hints.iter().any(|hint| image.contains(hint)) {
            score += IMAGE_BONUS;
        }
    }
    if contains_any(text, profile.specifications) {
        score += SPEC_BONUS;
    }
    score += CATEGORY_WEIGHT * primary_ratio(profile, text);

    clamp01(score)
}
