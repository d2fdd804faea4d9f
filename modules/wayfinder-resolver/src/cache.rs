use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use wayfinder_common::PlaceRecord;

/// Read-through cache of search results keyed by the exact query string.
/// Only successful lookups are stored; an empty result is still a result.
pub struct SearchCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    stored_at: Instant,
    records: Vec<PlaceRecord>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, query: &str) -> Option<Vec<PlaceRecord>> {
        let entries = self.entries.read().await;
        let entry = entries.get(query)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.records.clone())
    }

    pub async fn insert(&self, query: &str, records: Vec<PlaceRecord>) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.stored_at.elapsed() < self.ttl);
        entries.insert(
            query.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                records,
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache
            .insert("Fenway Park", vec![PlaceRecord::new("1", "Fenway Park", "Boston")])
            .await;
        assert_eq!(cache.get("Fenway Park").await.unwrap().len(), 1);
        assert!(cache.get("fenway park").await.is_none());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("Fenway Park").await.is_none());
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("a", Vec::new()).await;
        assert_eq!(cache.get("a").await, Some(Vec::new()));
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
