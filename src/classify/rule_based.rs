//! Hand-written classification rules, first match wins

use crate::classify::Classifier;
use crate::extract::contains_any;
use crate::models::Category;
use crate::models::CategoryScore;
use crate::models::ClassificationMethod;
use crate::models::MethodResult;
use crate::models::NormalizedQuery;

type Predicate = fn(&NormalizedQuery) -> bool;

/// A single domain rule
pub struct Rule {
    pub name: &'static str,
    pub category: Category,
    pub confidence: f64,
    pub predicate: Predicate,
}

fn model_in(query: &NormalizedQuery, prefix: &str, range: std::ops::RangeInclusive<u32>) -> bool {
    let attrs = &query.attributes;
    let Some(model) = attrs.model.as_deref() else {
        return false;
    };
    let digits_start = model.find(|c: char| c.is_ascii_digit()).unwrap_or(model.len());
    model[..digits_start] == *prefix && attrs.model_number().is_some_and(|n| range.contains(&n))
}

fn brand_is(query: &NormalizedQuery, brand: &str) -> bool {
    query.attributes.brand.as_deref() == Some(brand)
}

fn series_is(query: &NormalizedQuery, series: &str) -> bool {
    query.attributes.series.as_deref() == Some(series)
}

fn samsung_s_series(q: &NormalizedQuery) -> bool {
    brand_is(q, "samsung")
        && q.attributes.series.as_deref().map_or(true, |s| s == "galaxy")
        && model_in(q, "s", 1..=25)
}

fn samsung_a_series(q: &NormalizedQuery) -> bool {
    brand_is(q, "samsung")
        && q.attributes.series.as_deref().map_or(true, |s| s == "galaxy")
        && model_in(q, "a", 1..=100)
}

fn apple_iphone(q: &NormalizedQuery) -> bool {
    brand_is(q, "apple") && series_is(q, "iphone") && model_in(q, "", 1..=20)
}

fn google_pixel(q: &NormalizedQuery) -> bool {
    brand_is(q, "google") && series_is(q, "pixel") && model_in(q, "", 1..=12)
}

fn home_appliance_terms(q: &NormalizedQuery) -> bool {
    contains_any(
        &q.normalized,
        &[
            "washing machine",
            "washer",
            "front load",
            "top load",
            "refrigerator",
            "fridge",
            "freezer",
            "microwave",
            "dishwasher",
            "air conditioner",
            "water purifier",
            "vacuum cleaner",
            "geyser",
        ],
    )
}

fn electronics_terms(q: &NormalizedQuery) -> bool {
    contains_any(
        &q.normalized,
        &["tv", "television", "monitor", "speaker", "headphone", "earbud", "soundbar"],
    )
}

fn computer_terms(q: &NormalizedQuery) -> bool {
    contains_any(
        &q.normalized,
        &["laptop", "desktop", "computer", "macbook", "notebook", "chromebook"],
    )
}

fn phone_terms(q: &NormalizedQuery) -> bool {
    contains_any(&q.normalized, &["phone", "smartphone", "mobile"])
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "Samsung Galaxy S series",
            category: Category::MobilePhones,
            confidence: 0.95,
            predicate: samsung_s_series,
        },
        Rule {
            name: "Samsung Galaxy A series",
            category: Category::MobilePhones,
            confidence: 0.95,
            predicate: samsung_a_series,
        },
        Rule {
            name: "Apple iPhone",
            category: Category::MobilePhones,
            confidence: 0.95,
            predicate: apple_iphone,
        },
        Rule {
            name: "Google Pixel",
            category: Category::MobilePhones,
            confidence: 0.9,
            predicate: google_pixel,
        },
        Rule {
            name: "Home appliance keywords",
            category: Category::HomeAppliances,
            confidence: 0.9,
            predicate: home_appliance_terms,
        },
        Rule {
            name: "Electronics keywords",
            category: Category::Electronics,
            confidence: 0.85,
            predicate: electronics_terms,
        },
        Rule {
            name: "Computer keywords",
            category: Category::Computers,
            confidence: 0.85,
            predicate: computer_terms,
        },
        Rule {
            name: "Phone keywords",
            category: Category::MobilePhones,
            confidence: 0.85,
            predicate: phone_terms,
        },
    ]
}

pub struct RuleBasedClassifier {
    rules: Vec<Rule>,
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl RuleBasedClassifier {
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

impl Classifier for RuleBasedClassifier {
    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::RuleBased
    }

    fn classify(&self, query: &NormalizedQuery) -> Option<MethodResult> {
        let primary = self
            .rules
            .iter()
            .find(|rule| (rule.predicate)(query))
            .map_or_else(
                || CategoryScore {
                    category: Category::Electronics,
                    score: 0.5,
                    confidence: 0.5,
                    reason: "No rule matched".to_string(),
                },
                |rule| CategoryScore {
                    category: rule.category,
                    score: rule.confidence,
                    confidence: rule.confidence,
                    reason: rule.name.to_string(),
                },
            );

        Some(MethodResult {
            method: self.method(),
            primary,
            alternatives: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryUnderstanding;

    fn classify(text: &str) -> CategoryScore {
        let query = QueryUnderstanding::new().normalize(text).unwrap();
        RuleBasedClassifier::default().classify(&query).unwrap().primary
    }

    #[test]
    fn test_samsung_s_series_rule() {
        let score = classify("samsung galaxy s25");
        assert_eq!(score.category, Category::MobilePhones);
        assert_eq!(score.confidence, 0.95);
        assert_eq!(score.reason, "Samsung Galaxy S series");
    }

    #[test]
    fn test_s_series_out_of_range_falls_through() {
        // s99 is outside the known S range and carries no phone keyword
        let score = classify("samsung galaxy s99");
        assert_eq!(score.category, Category::Electronics);
        assert_eq!(score.confidence, 0.5);
    }

    #[test]
    fn test_iphone_rule() {
        let score = classify("iphone 15 pro");
        assert_eq!(score.category, Category::MobilePhones);
        assert_eq!(score.reason, "Apple iPhone");
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(classify("washing machine").category, Category::HomeAppliances);
        assert_eq!(classify("front load washer").category, Category::HomeAppliances);
        assert_eq!(classify("top load 7kg").category, Category::HomeAppliances);
        assert_eq!(classify("55 inch tv").category, Category::Electronics);
        assert_eq!(classify("gaming laptop").category, Category::Computers);
        assert_eq!(classify("camera phone").category, Category::MobilePhones);
    }

    #[test]
    fn test_fallback_rule() {
        let score = classify("gift ideas");
        assert_eq!(score.category, Category::Electronics);
        assert_eq!(score.confidence, 0.5);
    }
}
