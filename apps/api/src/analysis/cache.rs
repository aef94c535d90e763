//! Time-boxed memoization of successful analyses, keyed by lowercased username.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::models::analysis::AnalysisResponse;

pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: AnalysisResponse,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// Expiry is lazy: an entry past its TTL is removed by the first `get` that sees it.
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, username: &str) -> Option<AnalysisResponse> {
        let key = username.to_lowercase();

        let hit = self.entries.get(&key).and_then(|entry| {
            (!entry.is_expired(self.ttl)).then(|| (entry.response.clone(), entry.inserted_at.elapsed()))
        });

        match hit {
            Some((response, age)) => {
                info!("Cache HIT for {} (age: {}s)", key, age.as_secs());
                Some(response)
            }
            None => {
                // Re-check under the write lock so a concurrent fresh `put` survives.
                if self
                    .entries
                    .remove_if(&key, |_, entry| entry.is_expired(self.ttl))
                    .is_some()
                {
                    debug!("Cache expired for {}", key);
                }
                None
            }
        }
    }

    /// Stores a response. Mock responses are refused so a placeholder never masks a later
    /// live analysis. Returns whether the response was stored.
    pub fn put(&self, username: &str, response: AnalysisResponse) -> bool {
        let key = username.to_lowercase();
        if response.is_mock() {
            info!("Cache SKIPPED mock data for {}", key);
            return false;
        }

        self.entries.insert(
            key.clone(),
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
        info!("Cache STORED for {} (total cached: {})", key, self.entries.len());
        true
    }
}

#[cfg(test)]
impl AnalysisCache {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
