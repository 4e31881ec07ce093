//! Byte-level cache interface.
//!
//! Keys are readable strings built by [`LayerCacheClient`](super::LayerCacheClient);
//! values are opaque bytes. Async methods return a boxed future so a backend
//! can sit behind `Arc<dyn Cache>`.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Failure reported by a cache backend.
///
/// The render path logs these and reads the store instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value alone exceeds the backend capacity.
    #[error("entry of {size} bytes exceeds cache capacity of {capacity} bytes")]
    Oversized { size: usize, capacity: u64 },

    #[error("cache backend failed: {0}")]
    Backend(String),
}

/// Boxed, sendable future used by dyn-compatible async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared key-value cache for encoded pyramid lookups.
pub trait Cache: Send + Sync {
    /// `Ok(None)` is a miss.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, CacheError>>;

    /// Insert or replace the entry for `key`.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Weighted size of the held values in bytes.
    fn size_bytes(&self) -> u64;

    fn entry_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::Oversized { size: 100, capacity: 50 };
        assert_eq!(err.to_string(), "entry of 100 bytes exceeds cache capacity of 50 bytes");

        let err = CacheError::Backend("gone".to_string());
        assert_eq!(err.to_string(), "cache backend failed: gone");
    }
}
