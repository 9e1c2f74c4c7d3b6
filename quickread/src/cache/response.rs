//! Bounded insertion-ordered store of generation results.

use std::collections::VecDeque;

use tokio::sync::RwLock;
use tracing::debug;

use super::key::CacheKey;
use crate::llm::GenerationResult;

/// Entries kept per session.
pub const RESPONSE_CACHE_CAPACITY: usize = 10;

/// Fingerprint-keyed results, oldest first.
///
/// Every operation takes the lock once, so concurrent tasks never lose an insert and the
/// size bound holds at all times.
pub struct ResponseCache {
    entries: RwLock<VecDeque<(CacheKey, GenerationResult)>>,
    capacity: usize,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_capacity(RESPONSE_CACHE_CAPACITY)
    }

    /// Capacity below 1 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn lookup(&self, key: &CacheKey) -> Option<GenerationResult> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Replaces any entry with the same key, appends as newest, evicts from the front.
    pub async fn insert(&self, key: CacheKey, value: GenerationResult) {
        let mut entries = self.entries.write().await;
        entries.retain(|(k, _)| *k != key);
        entries.push_back((key, value));
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.pop_front() {
                debug!(key = %evicted, "response cache evicted");
            }
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            debug!(entries = entries.len(), "response cache cleared");
        }
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Keys, oldest first.
    pub async fn keys(&self) -> Vec<CacheKey> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
