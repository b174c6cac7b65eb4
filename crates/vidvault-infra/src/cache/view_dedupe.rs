use std::time::Duration;

use moka::sync::Cache;

/// Client addresses that recently counted a view.
///
/// Expiry is fixed from insertion; repeated views from the same address do not
/// extend it.
#[derive(Clone)]
pub struct ViewDedupeCache {
    cache: Cache<String, ()>,
    ttl: Duration,
}

impl ViewDedupeCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache, ttl }
    }

    /// Insert a marker for `client_address` unless one is live.
    ///
    /// Returns `true` when this call inserted the marker. Concurrent callers for the
    /// same address see exactly one `true`.
    pub fn try_mark(&self, client_address: &str) -> bool {
        self.cache
            .entry_by_ref(client_address)
            .or_insert(())
            .is_fresh()
    }

    pub fn contains(&self, client_address: &str) -> bool {
        self.cache.contains_key(client_address)
    }

    /// Drop a marker so the next view from the address counts again
    pub fn unmark(&self, client_address: &str) {
        self.cache.invalidate(client_address);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for ViewDedupeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDedupeCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_mark_once_per_address() {
        let cache = ViewDedupeCache::new(100, Duration::from_secs(300));
        assert!(cache.try_mark("10.0.0.1"));
        assert!(!cache.try_mark("10.0.0.1"));
        assert!(cache.try_mark("10.0.0.2"));
        assert!(cache.contains("10.0.0.1"));
    }

    #[test]
    fn test_unmark_allows_next_mark() {
        let cache = ViewDedupeCache::new(100, Duration::from_secs(300));
        assert!(cache.try_mark("10.0.0.1"));
        cache.unmark("10.0.0.1");
        assert!(cache.try_mark("10.0.0.1"));
    }

    #[test]
    fn test_window_is_not_extended_by_repeats() {
        let cache = ViewDedupeCache::new(100, Duration::from_millis(400));
        assert!(cache.try_mark("10.0.0.1"));
        std::thread::sleep(Duration::from_millis(250));
        assert!(!cache.try_mark("10.0.0.1"));
        std::thread::sleep(Duration::from_millis(350));
        assert!(cache.try_mark("10.0.0.1"));
    }

    #[test]
    fn test_concurrent_marks_admit_one() {
        let cache = ViewDedupeCache::new(100, Duration::from_secs(300));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if cache.try_mark("192.168.1.7") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
