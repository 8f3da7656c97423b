use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;

/// Signatures the monitor has already emitted, with the instant they were emitted.
///
/// Entries are only refreshed when a signature is emitted again, so the LRU
/// order is also timestamp order and expired entries sit at the cold end.
#[derive(Clone, Debug)]
pub struct SeenSignatures {
    entries: Arc<Mutex<LruCache<String, Instant>>>,
    window: Duration,
}

impl SeenSignatures {
    pub fn new(capacity: NonZeroUsize, window: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            window,
        }
    }

    /// Records `signature` and returns true when it should be emitted.
    ///
    /// A signature is novel when it was never seen or its entry is older than
    /// the suppression window. Suppressed sightings leave the entry untouched.
    pub async fn observe(&self, signature: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;

        if let Some(last_seen) = entries.peek(signature) {
            if now.saturating_duration_since(*last_seen) < self.window {
                return false;
            }
        }

        entries.put(signature.to_string(), now);
        true
    }

    /// Drops entries whose window has elapsed. Returns how many were removed.
    pub async fn prune(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let mut removed = 0;

        loop {
            let expired = matches!(
                entries.peek_lru(),
                Some((_, last_seen)) if now.saturating_duration_since(*last_seen) >= self.window
            );
            if !expired {
                break;
            }
            entries.pop_lru();
            removed += 1;
        }

        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn cache() -> SeenSignatures {
        SeenSignatures::new(NonZeroUsize::new(16).unwrap(), HOUR)
    }

    #[tokio::test]
    async fn suppresses_within_window_and_reemits_after() {
        let seen = cache();
        let start = Instant::now();

        assert!(seen.observe("S1", start).await);
        assert!(!seen.observe("S1", start + Duration::from_secs(30)).await);
        assert!(!seen.observe("S1", start + HOUR - Duration::from_secs(1)).await);
        assert!(seen.observe("S1", start + HOUR + Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn suppressed_sighting_does_not_extend_window() {
        let seen = cache();
        let start = Instant::now();

        assert!(seen.observe("S1", start).await);
        assert!(!seen.observe("S1", start + Duration::from_secs(1800)).await);
        // Measured from the emission, not from the last sighting
        assert!(seen.observe("S1", start + HOUR).await);
    }

    #[tokio::test]
    async fn prune_removes_only_expired_entries() {
        let seen = cache();
        let start = Instant::now();

        seen.observe("old", start).await;
        seen.observe("new", start + Duration::from_secs(1800)).await;

        assert_eq!(seen.prune(start + HOUR + Duration::from_secs(1)).await, 1);
        assert_eq!(seen.len().await, 1);
        assert!(!seen.observe("new", start + HOUR + Duration::from_secs(2)).await);
        assert!(seen.observe("old", start + HOUR + Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn capacity_bounds_memory() {
        let seen = SeenSignatures::new(NonZeroUsize::new(2).unwrap(), HOUR);
        let now = Instant::now();

        for signature in ["a", "b", "c"] {
            assert!(seen.observe(signature, now).await);
        }
        assert_eq!(seen.len().await, 2);
    }
}
