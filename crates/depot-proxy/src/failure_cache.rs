//! Recently-failed remote URLs
//!
//! Entries live for a fixed TTL and are dropped lazily the next time they
//! are looked up. Nothing is persisted; a restart forgets every failure.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default lifetime of a failure record
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(5 * 60);

/// Time-bounded record of failed URLs, safe to share across tasks
#[derive(Debug)]
pub struct FailureCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Instant>>,
}

impl FailureCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remember that `url` just failed
    pub fn record_failure(&self, url: &str) {
        self.record_failure_at(url, Instant::now());
    }

    fn record_failure_at(&self, url: &str, at: Instant) {
        self.lock().insert(url.to_string(), at);
    }

    /// Has `url` failed within the TTL?
    pub fn has_failed(&self, url: &str) -> bool {
        self.has_failed_at(url, Instant::now())
    }

    fn has_failed_at(&self, url: &str, now: Instant) -> bool {
        let mut entries = self.lock();
        match entries.get(url) {
            Some(recorded) if now.saturating_duration_since(*recorded) < self.ttl => true,
            Some(_) => {
                entries.remove(url);
                false
            }
            None => false,
        }
    }

    /// Number of records, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FailureCache {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const URL: &str = "https://repo.example.com/org/example/app/1.0/app-1.0.jar";

    #[test]
    fn test_record_and_lookup() {
        let cache = FailureCache::default();
        assert!(!cache.has_failed(URL));

        cache.record_failure(URL);
        assert!(cache.has_failed(URL));
        assert!(!cache.has_failed("https://repo.example.com/other"));
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = FailureCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.record_failure_at(URL, start);

        assert!(cache.has_failed_at(URL, start + Duration::from_secs(59)));
        assert_eq!(cache.len(), 1);

        assert!(!cache.has_failed_at(URL, start + Duration::from_secs(61)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_re_recording_extends_lifetime() {
        let cache = FailureCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.record_failure_at(URL, start);
        cache.record_failure_at(URL, start + Duration::from_secs(50));

        assert!(cache.has_failed_at(URL, start + Duration::from_secs(100)));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(FailureCache::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let url = format!("https://remote-{}/{}", i, j);
                        cache.record_failure(&url);
                        assert!(cache.has_failed(&url));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);

        cache.clear();
        assert!(cache.is_empty());
    }
}
