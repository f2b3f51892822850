//! Key-value storage for assembled listings.
//!
//! The listing pipeline only needs two independent operations, `get` and
//! `put`. There is no compare-and-swap and no invalidation: concurrent misses
//! may overwrite each other's entries with equivalent values.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use tracing::warn;

use super::config::CacheConfig;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

impl CacheStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// String-keyed store holding serialized listing artifacts.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    async fn put(&self, key: &str, value: String) -> Result<(), CacheStoreError>;
}

/// In-process store with LRU eviction.
pub struct MemoryKvStore {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryKvStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.store_capacity())),
        }
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, LruCache<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    target_module = SOURCE,
                    lock_kind = "mutex.lock",
                    result = "poisoned_recovered",
                    hint = "entries may be stale after panic in another thread",
                    "Recovered from poisoned cache lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        Ok(self.lock("get").get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CacheStoreError> {
        self.lock("put").put(key.to_string(), value);
        Ok(())
    }
}
