//! Time-bounded in-memory cache.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Map whose entries expire `ttl` after insertion.
///
/// Expired entries are evicted lazily by `get` or in bulk by `purge_expired`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, inserted: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted) < self.ttl
    }

    pub(crate) fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (now, value));
    }

    pub(crate) fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let (inserted, value) = self.entries.get(key)?;
        if self.is_fresh(*inserted, now) {
            return Some(value.clone());
        }
        self.entries.remove(key);
        None
    }

    pub(crate) fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (inserted, _)| now.saturating_duration_since(*inserted) < ttl);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_returned() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("tickers", vec!["AAPL".to_string()]);
        assert_eq!(cache.get(&"tickers"), Some(vec!["AAPL".to_string()]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("k", 1, start);

        assert_eq!(cache.get_at(&"k", start + Duration::from_secs(59)), Some(1));
        assert_eq!(cache.get_at(&"k", start + Duration::from_secs(60)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_drops_only_expired() {
        let mut cache = TtlCache::new(Duration::from_secs(10));
        let start = Instant::now();
        cache.insert_at("old", 1, start);
        cache.insert_at("new", 2, start + Duration::from_secs(8));

        assert_eq!(cache.purge_expired_at(start + Duration::from_secs(12)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"new", start + Duration::from_secs(12)), Some(2));
    }

    #[test]
    fn test_missing_key() {
        let mut cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(1));
        assert_eq!(cache.get(&"nope"), None);
        assert_eq!(cache.purge_expired(), 0);
    }
}
