//! moka-backed in-memory cache.
//!
//! Entries are weighed by value length, so the configured capacity caps
//! the bytes held rather than the number of entries.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::info;

use crate::cache::traits::{BoxFuture, Cache, CacheError};

pub struct MemoryCacheProvider {
    entries: MokaCache<String, Vec<u8>>,
    capacity: u64,
}

impl MemoryCacheProvider {
    /// Cache holding at most `capacity` bytes of values. Entries expire
    /// after `ttl` when one is given.
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let builder = MokaCache::builder()
            .max_capacity(capacity)
            .weigher(|_: &String, value: &Vec<u8>| u32::try_from(value.len()).unwrap_or(u32::MAX));
        let builder = match ttl {
            Some(ttl) => builder.time_to_live(ttl),
            None => builder,
        };

        info!(capacity, ttl = ?ttl, "Memory cache ready");
        Self {
            entries: builder.build(),
            capacity,
        }
    }

    #[cfg(test)]
    async fn settle(&self) {
        self.entries.run_pending_tasks().await;
    }
}

impl Cache for MemoryCacheProvider {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, CacheError>> {
        let key = key.to_owned();
        Box::pin(async move { Ok(self.entries.get(&key).await) })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), CacheError>> {
        let key = key.to_owned();
        Box::pin(async move {
            if value.len() as u64 > self.capacity {
                return Err(CacheError::Oversized {
                    size: value.len(),
                    capacity: self.capacity,
                });
            }
            self.entries.insert(key, value).await;
            Ok(())
        })
    }

    fn size_bytes(&self) -> u64 {
        self.entries.weighted_size()
    }

    fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}
