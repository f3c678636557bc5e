//! Data model shared by every pipeline stage
//!
//! Values flow one way: `SearchRequest` → `NormalizedQuery` →
//! `CategoryClassification` → `Candidate` → `ScoredCandidate` → `SearchResultPage`.
//! Nothing here is persisted; every value lives for a single request.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::ShopRankError;

/// Clamp a score into the crate-wide [0, 1] convention
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ====== Request ======

/// Product category known to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MobilePhones,
    HomeAppliances,
    Electronics,
    Computers,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::MobilePhones,
        Category::HomeAppliances,
        Category::Electronics,
        Category::Computers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MobilePhones => "mobile_phones",
            Self::HomeAppliances => "home_appliances",
            Self::Electronics => "electronics",
            Self::Computers => "computers",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ShopRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mobile_phones" | "mobile" | "mobiles" | "phones" | "smartphones" => {
                Ok(Self::MobilePhones)
            }
            "home_appliances" | "appliances" | "home" => Ok(Self::HomeAppliances),
            "electronics" => Ok(Self::Electronics),
            "computers" | "laptops" | "computing" => Ok(Self::Computers),
            other => Err(ShopRankError::InvalidQuery(format!("Unknown category: {other}"))),
        }
    }
}

/// Trust bucket of a source, queried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Primary,
    Secondary,
    Tertiary,
}

impl SourceTier {
    pub const ALL: [SourceTier; 3] = [SourceTier::Primary, SourceTier::Secondary, SourceTier::Tertiary];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse price bucket requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRange {
    Low,
    Medium,
    High,
}

impl PriceRange {
    /// Shopping hint terms appended to provider queries
    pub fn hint_terms(self) -> &'static str {
        match self {
            Self::Low => "affordable cheap budget",
            Self::Medium => "mid range value",
            Self::High => "premium flagship",
        }
    }
}

impl FromStr for PriceRange {
    type Err = ShopRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "mid" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ShopRankError::InvalidQuery(format!("Unknown price range: {other}"))),
        }
    }
}

/// Final sort order applied before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
}

impl FromStr for SortBy {
    type Err = ShopRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "relevance" => Ok(Self::Relevance),
            "price_low" => Ok(Self::PriceLow),
            "price_high" => Ok(Self::PriceHigh),
            "rating" => Ok(Self::Rating),
            other => Err(ShopRankError::InvalidQuery(format!("Unknown sort order: {other}"))),
        }
    }
}

/// A user search: free text plus optional filters. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            price_range: None,
            sort_by: SortBy::Relevance,
            page: 1,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    #[must_use]
    pub fn with_price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = Some(price_range);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

// ====== Query understanding ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SpecificModel,
    Comparison,
    CategoryBrowsing,
    BrandExploration,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
}

/// Storage capacity as written, e.g. `256 gb`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub value: f64,
    pub unit: String,
}

impl Storage {
    /// Capacity expressed in gigabytes
    pub fn gigabytes(&self) -> f64 {
        match self.unit.as_str() {
            "tb" => self.value * 1024.0,
            "mb" => self.value / 1024.0,
            _ => self.value,
        }
    }
}

/// Structured attributes recovered from free text. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub brand: Option<String>,
    pub series: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub storage: Option<Storage>,
    pub color: Option<String>,
    pub year: Option<u16>,
}

impl ProductAttributes {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.series.is_none()
            && self.model.is_none()
            && self.variant.is_none()
            && self.storage.is_none()
            && self.color.is_none()
            && self.year.is_none()
    }

    /// Numeric part of the model token, e.g. `25` for `s25`
    pub fn model_number(&self) -> Option<u32> {
        let model = self.model.as_deref()?;
        let digits: String = model
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    Range,
    Max,
    Target,
    Flexible,
}

/// Price budget in rupees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "type")]
    pub kind: BudgetType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub target: Option<f64>,
}

impl Budget {
    /// Single price the user is aiming at
    pub fn reference_price(&self) -> Option<f64> {
        match self.kind {
            BudgetType::Range => match (self.min, self.max) {
                (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
                (lo, hi) => hi.or(lo),
            },
            BudgetType::Max => self.max,
            BudgetType::Target | BudgetType::Flexible => self.target.or(self.max),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        let above_min = self.min.map_or(true, |lo| price >= lo);
        let below_max = self.max.map_or(true, |hi| price <= hi);
        above_min && below_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeaturePriority {
    Essential,
    Preferred,
    NiceToHave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRequirement {
    pub name: String,
    pub priority: FeaturePriority,
}

/// Quality adjective found in the query, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Best,
    Excellent,
    Top,
    Great,
    Good,
    Decent,
}

impl QualityLevel {
    /// Minimum star rating a listing should have to satisfy the adjective
    pub fn min_rating(self) -> f64 {
        match self {
            Self::Best => 4.9,
            Self::Excellent => 4.8,
            Self::Top => 4.7,
            Self::Great => 4.5,
            Self::Good => 4.0,
            Self::Decent => 3.5,
        }
    }
}

/// Query after normalization and attribute extraction.
///
/// Built once per request. Phase two (`QueryUnderstanding::build_variants`)
/// returns a new value carrying the category-specific variant rather than
/// editing this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedQuery {
    pub original: String,
    pub normalized: String,
    pub exact_match_variant: String,
    pub expanded_variant: String,
    pub category_specific_variant: Option<String>,
    pub attributes: ProductAttributes,
    pub intent: IntentClassification,
    pub budget: Option<Budget>,
    pub features: Vec<FeatureRequirement>,
    pub quality_levels: Vec<QualityLevel>,
    pub use_case: Option<String>,
    pub confidence: f64,
}

impl NormalizedQuery {
    /// Variant used for site-restricted retrieval
    pub fn retrieval_text(&self) -> &str {
        self.category_specific_variant
            .as_deref()
            .unwrap_or(&self.normalized)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }
}

// ====== Classification ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    RuleBased,
    FeatureBased,
    ZeroShot,
}

impl ClassificationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::FeatureBased => "feature_based",
            Self::ZeroShot => "zero_shot",
        }
    }
}

/// One category judgement produced by a single classifier method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: f64,
    pub confidence: f64,
    pub reason: String,
}

/// Output of one classifier method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: ClassificationMethod,
    pub primary: CategoryScore,
    pub alternatives: Vec<CategoryScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Uncertainty {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCategory {
    pub category: Category,
    pub confidence: f64,
    pub reason: String,
}

/// Ensemble verdict. `confidence` is never below any alternative's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryClassification {
    pub primary_category: Category,
    pub confidence: f64,
    pub score: f64,
    pub alternatives: Vec<AlternativeCategory>,
    pub contributing_methods: Vec<ClassificationMethod>,
    pub uncertainty: Uncertainty,
}

impl CategoryClassification {
    /// Neutral verdict used when no classifier produced a result
    pub fn fallback() -> Self {
        Self {
            primary_category: Category::Electronics,
            confidence: 0.5,
            score: 0.5,
            alternatives: Vec::new(),
            contributing_methods: vec![ClassificationMethod::RuleBased],
            uncertainty: Uncertainty::High,
        }
    }
}

// ====== Candidates ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
}

/// One listing fetched from a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub title: String,
    pub description: String,
    /// Always absolute
    pub url: String,
    pub domain: String,
    pub image: Option<String>,
    /// Raw currency string, e.g. `₹89,999`
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub availability: Availability,
    pub source_provider: String,
    pub tier: SourceTier,
    pub product_id: Option<String>,
    /// Provider returned schema.org-like product metadata
    pub has_structured_data: bool,
    /// Other tiers that returned the same product before dedup dropped them
    #[serde(default)]
    pub corroborating_tiers: Vec<SourceTier>,
}

impl Candidate {
    /// Title and description joined for text matching
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Every tier the candidate was surfaced by, without repeats
    pub fn tiers(&self) -> Vec<SourceTier> {
        let mut tiers = vec![self.tier];
        for tier in &self.corroborating_tiers {
            if !tiers.contains(tier) {
                tiers.push(*tier);
            }
        }
        tiers
    }
}

/// Per-candidate sub-scores, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub lexical: f64,
    pub semantic: f64,
    pub attribute: f64,
    pub cross_modal: f64,
    pub relevance: f64,
    pub business: f64,
    pub behavioral: f64,
    pub rrf: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub scores: Scores,
}

// ====== Response ======

/// Product projection exposed over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub price: Option<String>,
    pub currency: String,
    pub availability: Availability,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub seller: String,
    pub domain: String,
    pub url: String,
    pub image: Option<String>,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub category: Option<String>,
    pub price_range: Option<PriceRange>,
    pub sort_by: SortBy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfo {
    pub query: String,
    pub search_time_ms: u64,
    pub applied_filters: AppliedFilters,
    pub detected_category: Category,
    pub category_confidence: f64,
}

/// Immutable page handed back to the caller and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
    pub search_info: SearchInfo,
}
