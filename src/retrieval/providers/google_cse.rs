//! Google Custom Search JSON API adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ProviderError;
use crate::errors::ProviderErrorKind;
use crate::errors::Result;
use crate::errors::ShopRankError;
use crate::retrieval::provider::PageMap;
use crate::retrieval::provider::ProviderOptions;
use crate::retrieval::provider::RawProviderResult;
use crate::retrieval::provider::SearchProvider;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API refuses `num` above ten
const MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    pagemap: Option<serde_json::Value>,
}

/// Translate a raw CSE response body into provider results
pub fn parse_response(body: &str) -> std::result::Result<Vec<RawProviderResult>, serde_json::Error> {
    let response: CseResponse = serde_json::from_str(body)?;
    Ok(response
        .items
        .into_iter()
        .filter(|item| !item.link.is_empty())
        .map(|item| RawProviderResult {
            pagemap: item.pagemap.as_ref().map(PageMap::from_json).unwrap_or_default(),
            ..RawProviderResult::new(item.title, item.link, item.snippet)
        })
        .collect())
}

pub struct GoogleCseProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleCseProvider {
    pub fn new(name: impl Into<String>, api_key: String, engine_id: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShopRankError::Http(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            engine_id,
        })
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleCseProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        opts: &ProviderOptions,
    ) -> std::result::Result<Vec<RawProviderResult>, ProviderError> {
        let num = opts.max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        debug!("Calling Google CSE: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
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

        parse_response(&body).map_err(|e| {
            ProviderError::new(&self.name, ProviderErrorKind::Unknown, format!("Failed to parse response: {e}"))
        })
    }
}

/// Map a reqwest failure to the provider taxonomy
pub fn transport_error(provider: &str, err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(provider)
    } else {
        ProviderError::new(provider, ProviderErrorKind::Unknown, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_pagemap() {
        let body = r#"{
            "items": [
                {
                    "title": "Samsung Galaxy S25 Ultra 5G (Titanium Black, 256 GB)",
                    "link": "https://www.flipkart.com/samsung-galaxy-s25-ultra/p/itm123",
                    "snippet": "Buy Samsung Galaxy S25 Ultra online",
                    "pagemap": {
                        "offer": [{"price": "129999", "pricecurrency": "INR"}],
                        "aggregaterating": [{"ratingValue": 4.6, "reviewCount": "2150"}],
                        "cse_image": [{"src": "https://rukminim2.flixcart.com/s25.jpeg"}]
                    }
                },
                {"title": "no link"}
            ]
        }"#;

        let results = parse_response(body).unwrap();
        assert_eq!(results.len(), 1);
        let first = &results[0];
        assert_eq!(first.pagemap.first("offer", "price"), Some("129999"));
        assert_eq!(first.pagemap.first("aggregaterating", "ratingvalue"), Some("4.6"));
        assert!(first.pagemap.has_product_markup());
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_response(r#"{"kind": "customsearch#search"}"#).unwrap().is_empty());
        assert!(parse_response("not json").is_err());
    }
}
