use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Stable message returned to callers for any non-validation failure.
pub const GENERIC_SEARCH_FAILURE: &str = "Failed to search products";

/// Failure class reported by a `SearchProvider` adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Quota exhausted or HTTP 429. The provider is not retried within the request.
    RateLimited,
    InvalidCredentials,
    Timeout,
    Unknown,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RateLimited => "rate limited",
            Self::InvalidCredentials => "invalid credentials",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Error raised by a single provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("provider {provider} failed ({kind}): {message}")]
pub struct ProviderError {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::RateLimited, message)
    }

    pub fn timeout(provider: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Timeout, "request timed out")
    }

    /// Map an upstream HTTP status to a provider error
    pub fn from_status(provider: impl Into<String>, status: u16, body: &str) -> Self {
        let kind = match status {
            429 => ProviderErrorKind::RateLimited,
            401 | 403 => ProviderErrorKind::InvalidCredentials,
            408 | 504 => ProviderErrorKind::Timeout,
            _ => ProviderErrorKind::Unknown,
        };
        let snippet: String = body.chars().take(200).collect();
        Self::new(provider, kind, format!("HTTP {status}: {snippet}"))
    }

    pub fn is_quota_exhausted(&self) -> bool {
        self.kind == ProviderErrorKind::RateLimited
    }
}

#[derive(Error, Debug)]
pub enum ShopRankError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("All sources failed after {attempted} attempts")]
    AllSourcesFailed { attempted: usize },

    #[error("Search cancelled by caller")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl ShopRankError {
    /// HTTP status equivalent for the error taxonomy
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::Cancelled => 499,
            _ => 500,
        }
    }

    /// Message safe to show to end users; technical detail only for validation errors
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidQuery(msg) => msg.clone(),
            _ => GENERIC_SEARCH_FAILURE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ShopRankError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopRankError>;
