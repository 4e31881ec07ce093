//! Service configuration.

use std::time::Duration;

use crate::config::{ConfigFile, RenderConfig, DEFAULT_MEMORY_CACHE_SIZE};

/// Memory cache configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryCacheAppConfig {
    pub max_size_bytes: u64,
    pub ttl: Option<Duration>,
}

impl Default for MemoryCacheAppConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MEMORY_CACHE_SIZE as u64,
            ttl: None,
        }
    }
}

/// Top-level configuration passed to [`MosaicService::new`](super::MosaicService::new).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MosaicConfig {
    pub memory_cache: MemoryCacheAppConfig,
    /// Blocking pool size; `None` sizes from the available CPUs.
    pub pool_threads: Option<usize>,
    pub render: RenderConfig,
}

impl MosaicConfig {
    /// Build from a loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            memory_cache: MemoryCacheAppConfig {
                max_size_bytes: config.cache.memory_size as u64,
                ttl: config.cache.ttl_secs.map(Duration::from_secs),
            },
            pool_threads: config.pool.threads,
            render: config.render,
        }
    }

    pub fn with_memory_cache_size(mut self, size_bytes: u64) -> Self {
        self.memory_cache.max_size_bytes = size_bytes;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.memory_cache.ttl = Some(ttl);
        self
    }

    pub fn with_pool_threads(mut self, threads: usize) -> Self {
        self.pool_threads = Some(threads);
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.render.tile_size = tile_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_default() {
        let config = MemoryCacheAppConfig::default();
        assert_eq!(config.max_size_bytes, 512 * 1024 * 1024);
        assert!(config.ttl.is_none());
    }

    #[test]
    fn test_from_config_file() {
        let file = ConfigFile::parse("[cache]\nmemory_size = 1GB\nttl_secs = 30\n[pool]\nthreads = 6\n").unwrap();
        let config = MosaicConfig::from_config_file(&file);

        assert_eq!(config.memory_cache.max_size_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.memory_cache.ttl, Some(Duration::from_secs(30)));
        assert_eq!(config.pool_threads, Some(6));
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = MosaicConfig::default()
            .with_memory_cache_size(1024)
            .with_cache_ttl(Duration::from_secs(5))
            .with_pool_threads(2)
            .with_tile_size(512);

        assert_eq!(config.memory_cache.max_size_bytes, 1024);
        assert_eq!(config.memory_cache.ttl, Some(Duration::from_secs(5)));
        assert_eq!(config.pool_threads, Some(2));
        assert_eq!(config.render.tile_size, 512);
    }
}
