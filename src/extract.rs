//! Attribute extraction shared by query parsing and candidate parsing
//!
//! One canonical pattern per attribute type. `QueryUnderstanding` runs it
//! over the normalized query, the scorer and the re-ranker run it over
//! candidate titles, so both sides always agree on what "s25" or
//! "256 gb" means.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::catalog;
use crate::catalog::BrandProfile;
use crate::models::Availability;
use crate::models::ProductAttributes;
use crate::models::Storage;

lazy_static! {
    static ref STORAGE_RE: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*(gb|tb|mb)\b(\s*ram)?").expect("valid storage regex");
    static ref YEAR_RE: Regex = Regex::new(r"\b(20\d{2})\b").expect("valid year regex");
    static ref MODEL_RE: Regex =
        Regex::new(r"^[\s-]+([a-z]{0,4}\d{1,4}[a-z]{0,3})(\+)?").expect("valid model regex");
    static ref PRICE_NUMBER_RE: Regex =
        Regex::new(r"(\d[\d,]*(?:\.\d+)?)").expect("valid price regex");
    static ref PRICE_IN_TEXT_RE: Regex =
        Regex::new(r"(?:₹|rs\.?|inr)\s*(\d[\d,]*(?:\.\d{1,2})?)").expect("valid price regex");
    static ref RATING_RE: Regex =
        Regex::new(r"(\d(?:\.\d)?)\s*(?:★|out of 5|/\s*5\b|stars?\b)").expect("valid rating regex");
    static ref REVIEWS_RE: Regex =
        Regex::new(r"([\d,]+)\s*(?:reviews?|ratings?)\b").expect("valid reviews regex");
    static ref GTIN_RE: Regex = Regex::new(r"(?:^|\D)(\d{13})(?:\D|$)").expect("valid gtin regex");
    static ref ASIN_PATH_RE: Regex =
        Regex::new(r"/(?:dp|gp/product|product)/([A-Z0-9]{10})(?:[/?#]|$)").expect("valid asin regex");
    static ref ASIN_BARE_RE: Regex = Regex::new(r"\b(B0[A-Z0-9]{8})\b").expect("valid asin regex");
}

/// Words that may follow a model token as its variant
const VARIANT_WORDS: &[&str] = &[
    "ultra", "pro", "plus", "max", "mini", "fe", "lite", "neo", "edge", "air", "prime",
];

/// Unit words that turn a number after a brand into a measurement, not a model
const UNIT_WORDS: &[&str] = &[
    "inch", "inches", "thousand", "lakh", "kg", "l", "litre", "liter", "litres", "liters", "hz",
    "mah", "mp", "w", "watt", "star", "ton",
];

const UNIT_SUFFIXES: &[&str] = &["gb", "tb", "mb", "mp", "hz", "kg", "mah", "k"];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Byte offsets of every whole-word occurrence of `term` in `text`
fn term_spans<'a>(text: &'a str, term: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    text.match_indices(term).filter_map(move |(start, _)| {
        let end = start + term.len();
        let left_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let right_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        (left_ok && right_ok).then_some((start, end))
    })
}

/// First whole-word occurrence of `term`
pub fn find_term(text: &str, term: &str) -> Option<(usize, usize)> {
    if term.is_empty() {
        return None;
    }
    term_spans(text, term).next()
}

/// Whole-word match that also accepts a trailing plural `s`/`es`
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if find_term(text, term).is_some() {
        return true;
    }
    ["s", "es"]
        .iter()
        .any(|suffix| find_term(text, &format!("{term}{suffix}")).is_some())
}

/// Number of `terms` present in `text`
pub fn count_terms(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| contains_term(text, t)).count()
}

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| contains_term(text, t))
}

/// Lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a raw currency string such as `₹3,00,000` into a number
pub fn parse_price(raw: &str) -> Option<f64> {
    let caps = PRICE_NUMBER_RE.captures(raw)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let value: f64 = digits.parse().ok()?;
    (value > 0.0).then_some(value)
}

/// Make a link absolute, assuming https when the scheme is missing
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };
    Url::parse(&candidate)
        .ok()
        .filter(|u| u.host_str().is_some())
        .map(String::from)
}

/// Host of an absolute URL without a leading `www.`
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Product identifier embedded in a URL: 13-digit GTIN first, then ASIN
pub fn product_id_from_url(url: &str) -> Option<String> {
    if let Some(caps) = GTIN_RE.captures(url) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    ASIN_PATH_RE
        .captures(url)
        .or_else(|| ASIN_BARE_RE.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical form of a URL used as the last-resort dedup key
pub fn url_key(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_lowercase()
}

/// Compare two model tokens: equal, or one extends the other with a non-digit suffix
///
/// `s25` matches `s25`, `s25ultra` and `s25+`, never `s24` or `s250`.
pub fn models_match(a: &str, b: &str) -> bool {
    let a: String = a.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
    let b: String = b.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    long.strip_prefix(short.as_str())
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_ascii_digit())
}

/// Extracts structured product attributes from free text
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeExtractor;

impl AttributeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every attribute from `text`. Brand runs first; model parsing depends on it.
    pub fn extract(&self, text: &str) -> ProductAttributes {
        let text = text.to_lowercase();
        let mut attrs = ProductAttributes::default();

        if let Some((brand, _)) = self.brand(&text) {
            attrs.brand = Some(brand.name.to_string());
            let (series, model, variant) = self.series_model_variant(&text, brand);
            attrs.series = series;
            attrs.model = model;
            attrs.variant = variant;
        }
        attrs.storage = self.storage(&text);
        attrs.color = self.color(&text);
        attrs.year = self.year(&text);
        attrs
    }

    /// Earliest brand (by position) named directly or through an alias
    pub fn brand(&self, text: &str) -> Option<(&'static BrandProfile, usize)> {
        catalog::BRANDS
            .iter()
            .filter_map(|brand| {
                std::iter::once(brand.name)
                    .chain(brand.aliases.iter().copied())
                    .filter_map(|word| find_term(text, word).map(|(start, _)| start))
                    .min()
                    .map(|pos| (brand, pos))
            })
            .min_by_key(|(_, pos)| *pos)
    }

    fn series_model_variant(
        &self,
        text: &str,
        brand: &BrandProfile,
    ) -> (Option<String>, Option<String>, Option<String>) {
        let series_hit = brand
            .series
            .iter()
            .find_map(|s| find_term(text, s).map(|span| (*s, span)));

        // The model token follows the series if there is one, otherwise the brand word
        let anchor_end = match series_hit {
            Some((_, (_, end))) => Some(end),
            None => std::iter::once(brand.name)
                .chain(brand.aliases.iter().copied())
                .filter_map(|w| find_term(text, w))
                .map(|(_, end)| end)
                .min(),
        };

        let series = series_hit.map(|(s, _)| s.to_string());
        let Some(anchor_end) = anchor_end else {
            return (series, None, None);
        };

        let rest = &text[anchor_end..];
        let Some(caps) = MODEL_RE.captures(rest) else {
            return (series, None, None);
        };
        let Some(token) = caps.get(1) else {
            return (series, None, None);
        };
        let model = token.as_str();
        let after = &rest[caps.get(0).map_or(0, |m| m.end())..];
        let next_word = after.split_whitespace().next().unwrap_or("");

        if UNIT_SUFFIXES.iter().any(|u| model.ends_with(u) && model.len() > u.len())
            || UNIT_WORDS.contains(&next_word)
        {
            return (series, None, None);
        }

        let mut variants: Vec<&str> = Vec::new();
        if caps.get(2).is_some() {
            variants.push("plus");
        }
        for word in after.split_whitespace().take(2) {
            if VARIANT_WORDS.contains(&word) {
                variants.push(word);
            } else {
                break;
            }
        }
        let variant = (!variants.is_empty()).then(|| variants.join(" "));

        (series, Some(model.to_string()), variant)
    }

    /// Device storage, ignoring RAM figures; the largest capacity wins
    pub fn storage(&self, text: &str) -> Option<Storage> {
        STORAGE_RE
            .captures_iter(text)
            .filter(|caps| caps.get(3).is_none())
            .filter_map(|caps| {
                let value: f64 = caps.get(1)?.as_str().parse().ok()?;
                let unit = caps.get(2)?.as_str().to_string();
                Some(Storage { value, unit })
            })
            .max_by(|a, b| a.gigabytes().total_cmp(&b.gigabytes()))
    }

    pub fn color(&self, text: &str) -> Option<String> {
        catalog::COLORS
            .iter()
            .find(|c| find_term(text, c).is_some())
            .map(|c| (*c).to_string())
    }

    pub fn year(&self, text: &str) -> Option<u16> {
        YEAR_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Price written in free text, returned as a rupee string
    pub fn price_in_text(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        PRICE_IN_TEXT_RE
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("₹{}", m.as_str()))
    }

    pub fn rating_in_text(&self, text: &str) -> Option<f64> {
        let lower = text.to_lowercase();
        RATING_RE
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|r| (0.0..=5.0).contains(r))
    }

    pub fn review_count_in_text(&self, text: &str) -> Option<u64> {
        let lower = text.to_lowercase();
        REVIEWS_RE
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
    }

    pub fn availability(&self, text: &str) -> Availability {
        let lower = text.to_lowercase();
        if catalog::OUT_OF_STOCK_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Availability::OutOfStock
        } else if ["in stock", "instock", "available now", "ready to ship"]
            .iter()
            .any(|k| lower.contains(k))
        {
            Availability::InStock
        } else {
            Availability::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ProductAttributes {
        AttributeExtractor::new().extract(text)
    }

    #[test]
    fn test_samsung_galaxy_s25() {
        let attrs = extract("samsung galaxy s25");
        assert_eq!(attrs.brand.as_deref(), Some("samsung"));
        assert_eq!(attrs.series.as_deref(), Some("galaxy"));
        assert_eq!(attrs.model.as_deref(), Some("s25"));
        assert_eq!(attrs.variant, None);
    }

    #[test]
    fn test_variant_and_plus_suffix() {
        let attrs = extract("Samsung Galaxy S25 Ultra 5G (Titanium Black, 256 GB)");
        assert_eq!(attrs.model.as_deref(), Some("s25"));
        assert_eq!(attrs.variant.as_deref(), Some("ultra"));
        assert_eq!(attrs.color.as_deref(), Some("titanium black"));
        assert_eq!(attrs.storage.as_ref().map(Storage::gigabytes), Some(256.0));

        let plus = extract("galaxy s25+ 512gb");
        assert_eq!(plus.brand.as_deref(), Some("samsung"));
        assert_eq!(plus.model.as_deref(), Some("s25"));
        assert_eq!(plus.variant.as_deref(), Some("plus"));
    }

    #[test]
    fn test_alias_brand_and_numeric_model() {
        let attrs = extract("iphone 15 pro max");
        assert_eq!(attrs.brand.as_deref(), Some("apple"));
        assert_eq!(attrs.series.as_deref(), Some("iphone"));
        assert_eq!(attrs.model.as_deref(), Some("15"));
        assert_eq!(attrs.variant.as_deref(), Some("pro max"));
    }

    #[test]
    fn test_brand_without_series() {
        let attrs = extract("oneplus 12 5g");
        assert_eq!(attrs.brand.as_deref(), Some("oneplus"));
        assert_eq!(attrs.series, None);
        assert_eq!(attrs.model.as_deref(), Some("12"));
    }

    #[test]
    fn test_measurement_is_not_a_model() {
        let attrs = extract("samsung 55 inch tv");
        assert_eq!(attrs.brand.as_deref(), Some("samsung"));
        assert_eq!(attrs.model, None);

        let attrs = extract("samsung 50 thousand phone");
        assert_eq!(attrs.model, None);
    }

    #[test]
    fn test_storage_ignores_ram() {
        let attrs = extract("8gb ram 256gb storage");
        let storage = attrs.storage.unwrap();
        assert_eq!(storage.value, 256.0);
        assert_eq!(storage.unit, "gb");
    }

    #[test]
    fn test_year() {
        assert_eq!(extract("best phones 2024").year, Some(2024));
        assert_eq!(extract("under 20000").year, None);
    }

    #[test]
    fn test_contains_term_word_boundaries() {
        assert!(contains_term("samsung 4k tv", "tv"));
        assert!(contains_term("smart tvs on sale", "tv"));
        assert!(!contains_term("black phone", "ac"));
        assert!(contains_term("noise cancelling headphones", "headphone"));
        assert!(!contains_term("anything", ""));
    }

    #[test]
    fn test_parse_price_indian_format() {
        assert_eq!(parse_price("₹89,999"), Some(89999.0));
        assert_eq!(parse_price("₹3,00,000"), Some(300000.0));
        assert_eq!(parse_price("Rs. 1,299.50"), Some(1299.5));
        assert_eq!(parse_price("Price not available"), None);
    }

    #[test]
    fn test_price_rating_reviews_in_text() {
        let ex = AttributeExtractor::new();
        assert_eq!(ex.price_in_text("Now at Rs. 24,999 only").as_deref(), Some("₹24,999"));
        assert_eq!(ex.rating_in_text("Rated 4.3 ★ by buyers"), Some(4.3));
        assert_eq!(ex.rating_in_text("4.5 out of 5"), Some(4.5));
        assert_eq!(ex.review_count_in_text("12,345 ratings & 800 reviews"), Some(12345));
    }

    #[test]
    fn test_normalize_url_and_domain() {
        assert_eq!(
            normalize_url("www.flipkart.com/p/itm123").as_deref(),
            Some("https://www.flipkart.com/p/itm123")
        );
        assert_eq!(
            normalize_url("//amazon.in/dp/B0CX23V2ZK").as_deref(),
            Some("https://amazon.in/dp/B0CX23V2ZK")
        );
        assert_eq!(normalize_url("   "), None);
        assert_eq!(
            domain_of("https://www.Flipkart.com/p/itm123").as_deref(),
            Some("flipkart.com")
        );
    }

    #[test]
    fn test_product_id_from_url() {
        assert_eq!(
            product_id_from_url("https://shop.example/item/8801643711013").as_deref(),
            Some("8801643711013")
        );
        assert_eq!(
            product_id_from_url("https://www.amazon.in/Samsung-Galaxy/dp/B0DSKL9MQ8/ref=sr_1_1").as_deref(),
            Some("B0DSKL9MQ8")
        );
        assert_eq!(product_id_from_url("https://www.flipkart.com/samsung/p/itmabc"), None);
    }

    #[test]
    fn test_models_match() {
        assert!(models_match("s25", "s25"));
        assert!(models_match("s25", "s25 ultra"));
        assert!(models_match("s25", "s25+"));
        assert!(!models_match("s25", "s24"));
        assert!(!models_match("s25", "s250"));
        assert!(!models_match("s25", "a25"));
        assert!(!models_match("", "s25"));
    }

    #[test]
    fn test_availability() {
        let ex = AttributeExtractor::new();
        assert_eq!(ex.availability("Currently unavailable"), Availability::OutOfStock);
        assert_eq!(ex.availability("In stock. Free delivery"), Availability::InStock);
        assert_eq!(ex.availability("Great phone"), Availability::Unknown);
    }
}
