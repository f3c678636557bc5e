//! Provider success tracking and rate-limit bookkeeping

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;

/// Smoothing factor of the success-rate moving average
pub const SUCCESS_RATE_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderStat {
    pub success_rate: f64,
    pub last_request: Option<Instant>,
    pub requests: u64,
    pub failures: u64,
}

impl ProviderStat {
    fn new(initial_rate: f64) -> Self {
        Self {
            success_rate: initial_rate,
            last_request: None,
            requests: 0,
            failures: 0,
        }
    }
}

/// Read-only view for logs and the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatSnapshot {
    pub name: String,
    pub success_rate: f64,
    pub requests: u64,
    pub failures: u64,
}

/// Empirical provider health, shared across requests through `PipelineContext`
///
/// Only written between dispatch chunks, never from in-flight calls.
#[derive(Debug, Clone, Default)]
pub struct ProviderStats {
    stats: HashMap<String, ProviderStat>,
}

impl ProviderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ProviderStat> {
        self.stats.get(name)
    }

    /// Success rate used for ordering; unknown providers get `initial`
    pub fn success_rate(&self, name: &str, initial: f64) -> f64 {
        self.stats.get(name).map_or(initial, |s| s.success_rate)
    }

    /// True when a call now would violate the provider's minimum spacing
    pub fn is_rate_limited(&self, name: &str, min_interval: Duration, now: Instant) -> bool {
        if min_interval.is_zero() {
            return false;
        }
        self.stats
            .get(name)
            .and_then(|s| s.last_request)
            .is_some_and(|last| now.saturating_duration_since(last) < min_interval)
    }

    /// Mark the moment a request is issued
    pub fn mark_request(&mut self, name: &str, initial: f64, now: Instant) {
        let stat = self
            .stats
            .entry(name.to_string())
            .or_insert_with(|| ProviderStat::new(initial));
        stat.last_request = Some(now);
        stat.requests += 1;
    }

    /// Fold an outcome into the moving average
    pub fn record_outcome(&mut self, name: &str, initial: f64, success: bool) {
        let stat = self
            .stats
            .entry(name.to_string())
            .or_insert_with(|| ProviderStat::new(initial));
        let observed = if success { 1.0 } else { 0.0 };
        stat.success_rate = SUCCESS_RATE_ALPHA.mul_add(observed, (1.0 - SUCCESS_RATE_ALPHA) * stat.success_rate);
        if !success {
            stat.failures += 1;
        }
    }

    pub fn snapshot(&self) -> Vec<ProviderStatSnapshot> {
        let mut out: Vec<ProviderStatSnapshot> = self
            .stats
            .iter()
            .map(|(name, s)| ProviderStatSnapshot {
                name: name.clone(),
                success_rate: s.success_rate,
                requests: s.requests,
                failures: s.failures,
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
