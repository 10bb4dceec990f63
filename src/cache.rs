//! Optional TTL cache for route queries.
//!
//! Purely a façade concern: the engines are fast enough that correctness
//! never depends on this, so the semantics are deliberately loose —
//! last-write-wins on concurrent inserts, expiry checked lazily on read,
//! and a soft capacity bound enforced by pruning expired entries on
//! write. Injected explicitly via `Engine::with_route_cache`; there is no
//! process-global cache.

use std::time::{Duration, Instant};

use crate::engine::RouteSummary;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub from: String,
    pub to: String,
    pub profile: String,
    pub rain: bool,
}

struct CachedRoute {
    summary: RouteSummary,
    stored_at: Instant,
}

/// Concurrent route-summary cache with time-to-live eviction.
pub struct RouteCache {
    entries: scc::HashMap<CacheKey, CachedRoute>,
    ttl: Duration,
    capacity: usize,
}

impl RouteCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        RouteCache {
            entries: scc::HashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn get(&self, key: &CacheKey) -> Option<RouteSummary> {
        let now = Instant::now();
        match self.entries.read(key, |_, cached| {
            (now.duration_since(cached.stored_at) <= self.ttl).then(|| cached.summary.clone())
        }) {
            Some(Some(summary)) => Some(summary),
            Some(None) => {
                // Expired; drop it so the slot frees up.
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn put(&self, key: CacheKey, summary: RouteSummary) {
        if self.entries.len() >= self.capacity {
            let now = Instant::now();
            self.entries
                .retain(|_, cached| now.duration_since(cached.stored_at) <= self.ttl);
            if self.entries.len() >= self.capacity {
                // Still full of live entries; skip rather than evict work
                // another query may be about to reuse.
                return;
            }
        }

        let cached = CachedRoute { summary, stored_at: Instant::now() };
        // Last write wins: replace any entry a concurrent query stored.
        self.entries.remove(&key);
        let _ = self.entries.insert(key, cached);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(from: &str, to: &str) -> CacheKey {
        CacheKey {
            from: from.to_string(),
            to: to.to_string(),
            profile: "standard".to_string(),
            rain: false,
        }
    }

    fn summary(cost: f64) -> RouteSummary {
        RouteSummary {
            path: vec!["A".to_string(), "B".to_string()],
            indices: vec![0, 1],
            cost,
            timed_out: false,
        }
    }

    #[test]
    fn round_trips_within_ttl() {
        let cache = RouteCache::new(Duration::from_secs(60), 16);
        cache.put(key("A", "B"), summary(10.0));

        let hit = cache.get(&key("A", "B")).unwrap();
        assert_eq!(hit.cost, 10.0);
        assert!(cache.get(&key("A", "C")).is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = RouteCache::new(Duration::ZERO, 16);
        cache.put(key("A", "B"), summary(10.0));

        // Make sure the monotonic clock has ticked past the store time.
        let stored = Instant::now();
        while Instant::now() <= stored {
            std::hint::spin_loop();
        }

        assert!(cache.get(&key("A", "B")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let cache = RouteCache::new(Duration::from_secs(60), 16);
        cache.put(key("A", "B"), summary(10.0));
        cache.put(key("A", "B"), summary(20.0));

        assert_eq!(cache.get(&key("A", "B")).unwrap().cost, 20.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn live_entries_are_not_evicted_for_capacity() {
        let cache = RouteCache::new(Duration::from_secs(60), 2);
        cache.put(key("A", "B"), summary(1.0));
        cache.put(key("A", "C"), summary(2.0));
        cache.put(key("A", "D"), summary(3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A", "D")).is_none());
        assert!(cache.get(&key("A", "B")).is_some());
    }
}
