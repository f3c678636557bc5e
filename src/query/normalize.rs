//! Text normalization: case, spelling, currency expressions, plurals

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Captures;
use regex::Regex;

use crate::catalog;
use crate::extract::find_term;

const NUM: &str = r"(\d+(?:\.\d+)?)";

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref DIGIT_COMMA_RE: Regex = Regex::new(r"(\d),(\d)").expect("valid regex");
    static ref THOUSAND_RE: Regex =
        Regex::new(&format!(r"{NUM}\s*k\b(?:\s*(?:rupees?|rs)\b)?")).expect("valid regex");
    static ref LAKH_RE: Regex =
        Regex::new(&format!(r"{NUM}\s*(?:lakhs?|lacs?)\b(?:\s*(?:rupees?|rs)\b)?")).expect("valid regex");
    static ref RUPEE_SIGN_RE: Regex = Regex::new(&format!(r"₹\s*{NUM}")).expect("valid regex");
    static ref RS_PREFIX_RE: Regex =
        Regex::new(&format!(r"\b(?:rs\.?|inr)\s*{NUM}")).expect("valid regex");
    static ref RUPEES_SUFFIX_RE: Regex =
        Regex::new(&format!(r"{NUM}\s*(?:rupees?|rs)\b\.?")).expect("valid regex");
    static ref MAX_RE: Regex =
        Regex::new(r"\b(?:under|below|less than|within|upto|up to)\s+(\d)").expect("valid regex");
    static ref TARGET_RE: Regex =
        Regex::new(r"\b(?:around|about|approximately|approx|near)\s+(\d)").expect("valid regex");
    static ref BETWEEN_RE: Regex = Regex::new(&format!(
        r"\bbetween\s+{NUM}\s*(thousand|lakh)?\s*(?:-|to|and)\s*{NUM}\s*(thousand|lakh)?"
    ))
    .expect("valid regex");
    static ref DASH_RANGE_RE: Regex = Regex::new(&format!(
        r"\b{NUM}\s*(thousand|lakh)?\s*-\s*{NUM}\s*(thousand|lakh)\b"
    ))
    .expect("valid regex");
}

/// Phrasings of need, rewritten to a single keyword
const INTENT_PHRASES: &[(&str, &str)] = &[
    ("i am looking for", "need"),
    ("i'm looking for", "need"),
    ("looking for", "need"),
    ("searching for", "need"),
    ("i want", "need"),
    ("i need", "need"),
];

/// Replace every whole-word occurrence of `from` with `to`
pub fn replace_term(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some((start, end)) = find_term(&text[cursor..], from) {
        out.push_str(&text[cursor..cursor + start]);
        out.push_str(to);
        cursor += end;
    }
    out.push_str(&text[cursor..]);
    out
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn range_replacement(caps: &Captures<'_>) -> String {
    let low = &caps[1];
    let high = &caps[3];
    let low_unit = caps.get(2).map(|m| m.as_str());
    let high_unit = caps.get(4).map(|m| m.as_str());
    let mut out = format!("range {low}");
    if let Some(unit) = low_unit {
        out.push(' ');
        out.push_str(unit);
    }
    out.push_str(" to ");
    out.push_str(high);
    if let Some(unit) = high_unit {
        out.push(' ');
        out.push_str(unit);
    }
    out
}

/// Rewrite currency and budget phrasing into a canonical vocabulary
///
/// `50k` → `50 thousand`, `₹50000` → `50000`, `under X` → `max X`,
/// `around X` → `target X`, `between X-Y` → `range X to Y`.
pub fn normalize_currency(text: &str) -> String {
    let mut out = text.to_string();
    while DIGIT_COMMA_RE.is_match(&out) {
        out = DIGIT_COMMA_RE.replace_all(&out, "$1$2").into_owned();
    }

    out = THOUSAND_RE.replace_all(&out, "$1 thousand").into_owned();
    out = LAKH_RE.replace_all(&out, "$1 lakh").into_owned();
    out = RUPEE_SIGN_RE.replace_all(&out, "$1").into_owned();
    out = RS_PREFIX_RE.replace_all(&out, "$1").into_owned();
    out = RUPEES_SUFFIX_RE.replace_all(&out, "$1").into_owned();
    out = BETWEEN_RE.replace_all(&out, range_replacement).into_owned();
    out = DASH_RANGE_RE.replace_all(&out, range_replacement).into_owned();
    out = MAX_RE.replace_all(&out, "max $1").into_owned();
    out = TARGET_RE.replace_all(&out, "target $1").into_owned();
    out
}

fn apply_table<'a>(text: &'a str, table: &[(&str, &str)]) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(text);
    for (from, to) in table {
        if find_term(&out, from).is_some() {
            out = Cow::Owned(replace_term(&out, from, to));
        }
    }
    out
}

/// Full normalization pipeline applied to raw query text
pub fn normalize_text(raw: &str) -> String {
    let lowered = collapse_whitespace(&raw.to_lowercase());
    let spelled = apply_table(&lowered, catalog::MISSPELLINGS);
    let phrased = apply_table(&spelled, INTENT_PHRASES);
    let priced = normalize_currency(&phrased);
    let singular = apply_table(&priced, catalog::PLURALS);
    collapse_whitespace(&singular)
}
