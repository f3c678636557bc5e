//! Attribute agreement between the query and a listing

use crate::extract::models_match;
use crate::extract::parse_price;
use crate::models::clamp01;
use crate::models::Budget;
use crate::models::BudgetType;
use crate::models::ProductAttributes;

fn storage_match(query: &ProductAttributes, listing: &ProductAttributes) -> Option<f64> {
    let wanted = query.storage.as_ref()?.gigabytes();
    let offered = listing.storage.as_ref()?.gigabytes();
    let (lo, hi) = if wanted <= offered { (wanted, offered) } else { (offered, wanted) };
    (hi > 0.0).then(|| lo / hi)
}

fn color_match(query: &ProductAttributes, listing: &ProductAttributes) -> Option<f64> {
    let wanted = query.color.as_deref()?;
    let offered = listing.color.as_deref()?;
    let same = wanted == offered || wanted.contains(offered) || offered.contains(wanted);
    Some(if same { 1.0 } else { 0.0 })
}

fn model_match(query: &ProductAttributes, listing: &ProductAttributes) -> Option<f64> {
    let wanted = query.model.as_deref()?;
    let offered = listing.model.as_deref()?;
    Some(if models_match(wanted, offered) { 1.0 } else { 0.0 })
}

fn price_match(budget: Option<&Budget>, price: Option<&str>) -> Option<f64> {
    let budget = budget?;
    let price = parse_price(price?)?;
    let bounded = matches!(budget.kind, BudgetType::Range | BudgetType::Max);
    if bounded && budget.contains(price) {
        return Some(1.0);
    }
    let reference = budget.reference_price().filter(|r| *r > 0.0)?;
    Some(clamp01(1.0 - (price - reference).abs() / reference))
}

/// Mean agreement over the attributes both sides expose; 0 when none overlap
pub fn attribute_score(
    query: &ProductAttributes,
    budget: Option<&Budget>,
    listing: &ProductAttributes,
    listing_price: Option<&str>,
) -> f64 {
    let compared: Vec<f64> = [
        storage_match(query, listing),
        color_match(query, listing),
        model_match(query, listing),
        price_match(budget, listing_price),
    ]
    .into_iter()
    .flatten()
    .collect();

    if compared.is_empty() {
        0.0
    } else {
        clamp01(compared.iter().sum::<f64>() / compared.len() as f64)
    }
}
