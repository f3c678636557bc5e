//! Query suggestions and trending searches

use crate::catalog;

pub const MAX_SUGGESTIONS: usize = 5;

const COMMON_SEARCHES: &[&str] = &[
    "smartphone",
    "5g phone",
    "camera phone",
    "gaming phone",
    "laptop",
    "gaming laptop",
    "headphones",
    "wireless earbuds",
    "bluetooth speaker",
    "smartwatch",
    "tablet",
    "smart tv",
    "washing machine",
    "refrigerator",
    "air conditioner",
    "microwave",
];

pub const TRENDING: &[&str] = &[
    "iPhone 15",
    "Samsung Galaxy S25",
    "OnePlus 12",
    "Redmi Note 13",
    "MacBook Air",
    "Sony WH-1000XM5",
    "Samsung Galaxy Buds",
    "iPad Air",
    "LG washing machine",
    "PlayStation 5",
];

/// Up to five phrases containing `query`, common searches first, then brand product lines
pub fn suggestions(query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let brand_lines = catalog::BRANDS.iter().flat_map(|brand| {
        std::iter::once(brand.name.to_string())
            .chain(brand.series.iter().map(move |series| format!("{} {}", brand.name, series)))
    });

    let mut out: Vec<String> = Vec::new();
    for phrase in COMMON_SEARCHES.iter().map(|s| (*s).to_string()).chain(brand_lines) {
        if phrase.contains(&needle) && !out.contains(&phrase) {
            out.push(phrase);
            if out.len() == MAX_SUGGESTIONS {
                break;
            }
        }
    }
    out
}

pub fn trending() -> Vec<String> {
    TRENDING.iter().map(|s| (*s).to_string()).collect()
}
