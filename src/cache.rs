//! Result page cache
//!
//! In-memory TTL cache of finished `SearchResultPage`s, keyed by the
//! normalized query plus the serialized request options. Entries are
//! immutable snapshots; a fresh first-page request for a query drops every
//! cached page of that query before the pipeline runs again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;

use crate::models::PriceRange;
use crate::models::SearchResultPage;
use crate::models::SortBy;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    query: String,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, query: String, ttl: Duration) -> Self {
        Self {
            data,
            query,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
    pub enable_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_entries: 1000,
            enable_stats: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub expired_cleanups: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Request options that change the result page
#[derive(Serialize)]
struct KeyOptions<'a> {
    category: Option<&'a str>,
    price_range: Option<PriceRange>,
    sort_by: SortBy,
    page: usize,
}

/// sha256 over the normalized query and the JSON of its options
pub fn cache_key(
    normalized_query: &str,
    category: Option<&str>,
    price_range: Option<PriceRange>,
    sort_by: SortBy,
    page: usize,
) -> String {
    let options = KeyOptions {
        category,
        price_range,
        sort_by,
        page,
    };
    // Serializing a struct of plain enums and strings cannot fail
    let options_json = serde_json::to_string(&options).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(normalized_query.as_bytes());
    hasher.update(b"\n");
    hasher.update(options_json.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct SearchCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry<SearchResultPage>>>>,
    config: CacheConfig,
    stats: Arc<RwLock<CacheStats>>,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<SearchResultPage> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get(key) {
            if entry.is_expired() {
                entries.remove(key);
                self.record(|s| s.misses += 1).await;
                debug!("Cache miss (expired) for {}", key);
                return None;
            }
            self.record(|s| s.hits += 1).await;
            debug!("Cache hit for {}", key);
            return Some(entry.data.clone());
        }

        self.record(|s| s.misses += 1).await;
        debug!("Cache miss for {}", key);
        None
    }

    pub async fn put(&self, key: String, normalized_query: &str, page: SearchResultPage) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            self.evict(&mut entries).await;
        }
        entries.insert(
            key,
            CacheEntry::new(page, normalized_query.to_string(), self.config.ttl),
        );
    }

    /// Drop every cached page of one query; returns how many were removed
    pub async fn invalidate_query(&self, normalized_query: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.query != normalized_query);
        let removed = before - entries.len();
        if removed > 0 {
            self.record(|s| s.invalidations += removed as u64).await;
            debug!("Invalidated {} cached pages for '{}'", removed, normalized_query);
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared all cached search pages");
    }

    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            self.record(|s| s.expired_cleanups += removed as u64).await;
            debug!("Cleaned up {} expired cache entries", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        *self.stats.read().await
    }

    async fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if self.config.enable_stats {
            update(&mut *self.stats.write().await);
        }
    }

    /// Expired entries go first; otherwise the entry closest to expiry
    async fn evict(&self, entries: &mut HashMap<String, CacheEntry<SearchResultPage>>) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        if entries.len() == before {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
            }
        }
        let evicted = before - entries.len();
        self.record(|s| s.evictions += evicted as u64).await;
        debug!("Evicted {} cache entries", evicted);
    }
}
