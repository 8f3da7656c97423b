use std::future::Future;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use super::{error::ChainError, types::Transaction};

/// Parsed transactions keyed by (owner, signature).
///
/// A confirmed transaction never changes, so once parsed for an owner it is
/// served from memory on every later polling round. Failed fetches are not
/// stored and are retried on the next sighting.
pub struct TransactionCache {
    entries: Mutex<LruCache<(String, String), Transaction>>,
}

impl TransactionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached transaction or runs `fetch` and remembers its result.
    /// The lock is not held while `fetch` runs.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        owner: &str,
        signature: &str,
        fetch: F,
    ) -> Result<Transaction, ChainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Transaction, ChainError>>,
    {
        let key = (owner.to_string(), signature.to_string());
        if let Some(cached) = self.entries.lock().await.get(&key) {
            return Ok(cached.clone());
        }

        let transaction = fetch().await?;
        self.entries.lock().await.put(key, transaction.clone());
        Ok(transaction)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
