//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::errors::Result;
use crate::models::PriceRange;
use crate::models::SearchRequest;
use crate::models::SortBy;
use crate::retrieval::stats::ProviderStatSnapshot;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Technical detail, only populated in development mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: detail,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// `GET /search` query string. Enum-valued options arrive as text so bad
/// values become a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl SearchParams {
    pub fn into_request(self) -> Result<SearchRequest> {
        let query = self.query.unwrap_or_default();
        let mut request = SearchRequest::new(query).with_page(self.page.unwrap_or(1));

        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            request = request.with_category(category);
        }
        if let Some(range) = self.price_range.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            request = request.with_price_range(range.parse::<PriceRange>()?);
        }
        if let Some(sort) = self.sort_by.as_deref() {
            request = request.with_sort(sort.parse::<SortBy>()?);
        }
        Ok(request)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrendingResponse {
    pub trending: Vec<String>,
}

/// Runtime statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub cache_entries: usize,
    pub cache: CacheStats,
    pub cache_hit_rate: f64,
    pub providers: Vec<ProviderStatSnapshot>,
}
