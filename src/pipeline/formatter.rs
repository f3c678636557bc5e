//! Projection of ranked candidates into paginated response pages

use std::cmp::Ordering;

use sha2::Digest;
use sha2::Sha256;

use crate::extract::parse_price;
use crate::models::AppliedFilters;
use crate::models::CategoryClassification;
use crate::models::Pagination;
use crate::models::ProductView;
use crate::models::ScoredCandidate;
use crate::models::SearchInfo;
use crate::models::SearchRequest;
use crate::models::SearchResultPage;
use crate::models::SortBy;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const CURRENCY: &str = "INR";

/// Stable product id: first 16 hex chars of sha256(url)
pub fn product_id(url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    digest[..16].to_string()
}

/// Order two optional values, missing values last whatever the direction
fn missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseFormatter {
    page_size: usize,
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ResponseFormatter {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn to_view(scored: &ScoredCandidate) -> ProductView {
        let candidate = &scored.candidate;
        ProductView {
            id: product_id(&candidate.url),
            title: candidate.title.clone(),
            price: candidate.price.clone(),
            currency: CURRENCY.to_string(),
            availability: candidate.availability,
            rating: candidate.rating,
            reviews: candidate.review_count,
            seller: candidate.domain.clone(),
            domain: candidate.domain.clone(),
            url: candidate.url.clone(),
            image: candidate.image.clone(),
            description: candidate.description.clone(),
            score: scored.scores.final_score,
        }
    }

    /// Apply the requested order; relevance keeps the ranker's order
    pub fn sort(views: &mut [ProductView], sort_by: SortBy) {
        let price = |view: &ProductView| view.price.as_deref().and_then(parse_price);
        match sort_by {
            SortBy::Relevance => {}
            SortBy::PriceLow => views.sort_by(|a, b| missing_last(price(a), price(b), false)),
            SortBy::PriceHigh => views.sort_by(|a, b| missing_last(price(a), price(b), true)),
            SortBy::Rating => views.sort_by(|a, b| missing_last(a.rating, b.rating, true)),
        }
    }

    pub fn total_pages(&self, total_results: usize) -> usize {
        total_results.div_ceil(self.page_size)
    }

    fn page(&self, views: &[ProductView], page: usize, info: &SearchInfo) -> SearchResultPage {
        let page = page.max(1);
        let total_pages = self.total_pages(views.len());
        let start = (page - 1).saturating_mul(self.page_size).min(views.len());
        let end = (start + self.page_size).min(views.len());

        SearchResultPage {
            products: views[start..end].to_vec(),
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_results: views.len(),
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
            },
            search_info: info.clone(),
        }
    }

    fn views(&self, ranked: &[ScoredCandidate], sort_by: SortBy) -> Vec<ProductView> {
        let mut views: Vec<ProductView> = ranked.iter().map(Self::to_view).collect();
        Self::sort(&mut views, sort_by);
        views
    }

    /// Every page of the result set; an empty result still yields page one
    pub fn format_pages(
        &self,
        ranked: &[ScoredCandidate],
        request: &SearchRequest,
        classification: &CategoryClassification,
        search_time_ms: u64,
    ) -> Vec<SearchResultPage> {
        let views = self.views(ranked, request.sort_by);
        let info = search_info(request, classification, search_time_ms);
        let pages = self.total_pages(views.len()).max(1);
        (1..=pages).map(|page| self.page(&views, page, &info)).collect()
    }

    /// A single page, including pages past the end
    pub fn format_page(
        &self,
        ranked: &[ScoredCandidate],
        request: &SearchRequest,
        classification: &CategoryClassification,
        search_time_ms: u64,
    ) -> SearchResultPage {
        let views = self.views(ranked, request.sort_by);
        let info = search_info(request, classification, search_time_ms);
        self.page(&views, request.page, &info)
    }
}

fn search_info(
    request: &SearchRequest,
    classification: &CategoryClassification,
    search_time_ms: u64,
) -> SearchInfo {
    SearchInfo {
        query: request.query.trim().to_string(),
        search_time_ms,
        applied_filters: AppliedFilters {
            category: request.category.clone(),
            price_range: request.price_range,
            sort_by: request.sort_by,
        },
        detected_category: classification.primary_category,
        category_confidence: classification.confidence,
    }
}
