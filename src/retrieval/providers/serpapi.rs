//! SerpAPI Google Shopping adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ProviderError;
use crate::errors::ProviderErrorKind;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::retrieval::provider::ProviderOptions;
use crate::retrieval::provider::RawProviderResult;
use crate::retrieval::provider::SearchProvider;
use crate::retrieval::providers::google_cse::transport_error;

pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShoppingResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    product_link: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    reviews: Option<u64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    delivery: Option<String>,
}

/// Translate a SerpAPI response body into provider results
///
/// An `error` field in a 200 response still means failure; quota
/// messages map to `RateLimited`.
pub fn parse_response(
    provider: &str,
    body: &str,
) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
    let response: SerpResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(provider, ProviderErrorKind::Unknown, format!("Failed to parse response: {e}"))
    })?;

    if let Some(error) = response.error {
        let lower = error.to_lowercase();
        let kind = if lower.contains("run out of searches") || lower.contains("limit") {
            ProviderErrorKind::RateLimited
        } else if lower.contains("invalid api key") {
            ProviderErrorKind::InvalidCredentials
        } else {
            ProviderErrorKind::Unknown
        };
        return Err(ProviderError::new(provider, kind, error));
    }

    Ok(response
        .shopping_results
        .into_iter()
        .filter_map(|item| {
            let link = item.link.or(item.product_link)?;
            let snippet = [item.source.as_deref(), item.delivery.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" - ");
            // SerpAPI product ids are its own catalog keys, not GTINs, so they are not carried
            Some(RawProviderResult {
                price: item.price,
                rating: item.rating,
                review_count: item.reviews,
                image: item.thumbnail,
                ..RawProviderResult::new(item.title, link, snippet)
            })
        })
        .collect())
}

pub struct SerpApiProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SerpApiProvider {
    pub fn new(name: impl Into<String>, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShopRankError::Http(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
        })
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        let num = opts.max_results.max(1).to_string();
        debug!("Calling SerpAPI google_shopping: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google_shopping"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
                ("gl", opts.region.as_str()),
                ("hl", opts.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(&self.name, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.name, &e))?;
        if !status.is_success() {
            return Err(ProviderError::from_status(&self.name, status.as_u16(), &body));
        }
        parse_response(&self.name, &body)
    }
}
