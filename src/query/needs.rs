//! Shopper needs expressed in the query: budget, features, quality, use case
//!
//! All functions take the already-normalized text, so currency has been
//! rewritten to the `max` / `target` / `range X to Y` vocabulary.

use lazy_static::lazy_static;
use regex::Captures;
use regex::Regex;

use crate::extract::find_term;
use crate::models::Budget;
use crate::models::BudgetType;
use crate::models::FeaturePriority;
use crate::models::FeatureRequirement;
use crate::models::QualityLevel;

lazy_static! {
    static ref RANGE_RE: Regex = Regex::new(
        r"\brange\s+(\d+(?:\.\d+)?)\s*(thousand|lakh)?\s+to\s+(\d+(?:\.\d+)?)\s*(thousand|lakh)?"
    )
    .expect("valid regex");
    static ref MAX_RE: Regex =
        Regex::new(r"\bmax\s+(\d+(?:\.\d+)?)\s*(thousand|lakh)?").expect("valid regex");
    static ref TARGET_RE: Regex =
        Regex::new(r"\btarget\s+(\d+(?:\.\d+)?)\s*(thousand|lakh)?").expect("valid regex");
    static ref AMOUNT_RE: Regex =
        Regex::new(r"\b(\d+(?:\.\d+)?)\s*(thousand|lakh)?\b").expect("valid regex");
}

/// Smallest unit-less number treated as a price rather than a model or size
const BARE_PRICE_FLOOR: f64 = 5000.0;

fn multiplier(unit: Option<&str>) -> f64 {
    match unit {
        Some("thousand") => 1_000.0,
        Some("lakh") => 100_000.0,
        _ => 1.0,
    }
}

fn amount(caps: &Captures<'_>, value_idx: usize, unit: Option<&str>) -> Option<f64> {
    let value: f64 = caps.get(value_idx)?.as_str().parse().ok()?;
    Some(value * multiplier(unit))
}

/// Budget implied by the query, if any
pub fn extract_budget(text: &str) -> Option<Budget> {
    if let Some(caps) = RANGE_RE.captures(text) {
        let low_unit = caps.get(2).map(|m| m.as_str());
        let high_unit = caps.get(4).map(|m| m.as_str());
        // "20 to 30 thousand" shares the trailing unit
        let low = amount(&caps, 1, low_unit.or(high_unit))?;
        let high = amount(&caps, 3, high_unit.or(low_unit))?;
        let (min, max) = if low <= high { (low, high) } else { (high, low) };
        return Some(Budget {
            kind: BudgetType::Range,
            min: Some(min),
            max: Some(max),
            target: None,
        });
    }

    if let Some(caps) = MAX_RE.captures(text) {
        let max = amount(&caps, 1, caps.get(2).map(|m| m.as_str()))?;
        return Some(Budget {
            kind: BudgetType::Max,
            min: None,
            max: Some(max),
            target: None,
        });
    }

    if let Some(caps) = TARGET_RE.captures(text) {
        let target = amount(&caps, 1, caps.get(2).map(|m| m.as_str()))?;
        return Some(Budget {
            kind: BudgetType::Target,
            min: None,
            max: None,
            target: Some(target),
        });
    }

    AMOUNT_RE.captures_iter(text).find_map(|caps| {
        let unit = caps.get(2).map(|m| m.as_str());
        let raw = caps.get(1)?.as_str();
        let value = amount(&caps, 1, unit)?;
        let looks_like_year = unit.is_none() && raw.len() == 4 && raw.starts_with("20");
        let is_price = unit.is_some() || (value >= BARE_PRICE_FLOOR && !looks_like_year);
        is_price.then_some(Budget {
            kind: BudgetType::Flexible,
            min: None,
            max: None,
            target: Some(value),
        })
    })
}

/// (phrase, feature, phrase carries a quality adjective)
const FEATURE_PATTERNS: &[(&str, &str, bool)] = &[
    ("good camera", "camera_quality", true),
    ("great camera", "camera_quality", true),
    ("excellent camera", "camera_quality", true),
    ("best camera", "camera_quality", true),
    ("photography", "camera_quality", false),
    ("long battery", "battery_life", true),
    ("good battery", "battery_life", true),
    ("battery life", "battery_life", false),
    ("fast performance", "performance", true),
    ("fast processor", "performance", true),
    ("gaming", "gaming_performance", false),
    ("good display", "display_quality", true),
    ("amoled", "display_quality", false),
    ("large storage", "storage_capacity", true),
    ("student", "durability", false),
    ("budget", "value_for_money", false),
    ("premium", "build_quality", false),
    ("5g", "connectivity_5g", false),
];

const ESSENTIAL_CUES: &[&str] = &["must have", "essential", "need", "required", "mandatory"];
const PREFERRED_CUES: &[&str] = &["preferred", "prefer", "ideally", "would like"];

/// Features the shopper asked for, strongest priority kept per feature
pub fn extract_features(text: &str) -> Vec<FeatureRequirement> {
    let explicit = if ESSENTIAL_CUES.iter().any(|c| find_term(text, c).is_some()) {
        Some(FeaturePriority::Essential)
    } else if PREFERRED_CUES.iter().any(|c| find_term(text, c).is_some()) {
        Some(FeaturePriority::Preferred)
    } else {
        None
    };

    let mut features: Vec<FeatureRequirement> = Vec::new();
    for (phrase, name, qualified) in FEATURE_PATTERNS {
        if find_term(text, phrase).is_none() {
            continue;
        }
        let priority = explicit.unwrap_or(if *qualified {
            FeaturePriority::Essential
        } else {
            FeaturePriority::NiceToHave
        });
        match features.iter_mut().find(|f| f.name == *name) {
            Some(existing) => existing.priority = existing.priority.min(priority),
            None => features.push(FeatureRequirement {
                name: (*name).to_string(),
                priority,
            }),
        }
    }
    features
}

pub fn extract_quality_levels(text: &str) -> Vec<QualityLevel> {
    [
        ("best", QualityLevel::Best),
        ("excellent", QualityLevel::Excellent),
        ("top", QualityLevel::Top),
        ("great", QualityLevel::Great),
        ("good", QualityLevel::Good),
        ("decent", QualityLevel::Decent),
    ]
    .into_iter()
    .filter(|(word, _)| find_term(text, word).is_some())
    .map(|(_, level)| level)
    .collect()
}

pub fn extract_use_case(text: &str) -> Option<String> {
    const USE_CASES: &[(&str, &str)] = &[
        ("gaming", "gaming"),
        ("photography", "photography"),
        ("student", "student"),
        ("business", "business"),
        ("work", "business"),
        ("office", "business"),
        ("professional", "business"),
        ("senior", "senior"),
        ("elderly", "senior"),
        ("daily use", "casual"),
        ("casual", "casual"),
    ];
    USE_CASES
        .iter()
        .find(|(pattern, _)| find_term(text, pattern).is_some())
        .map(|(_, use_case)| (*use_case).to_string())
}
