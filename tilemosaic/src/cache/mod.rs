//! Cache-aside layer for pyramid lookups.
//!
//! ```text
//! CachedLayerReader ──► LayerCacheClient ──► Arc<dyn Cache> (moka)
//!        │ miss
//!        ▼
//!  BlockingPool ──► AttributeStore / TileStore
//! ```
//!
//! Cache failures never fail a render: they are logged and the store is
//! read instead.

mod clients;
mod providers;
mod reader;
mod traits;

pub use clients::{CacheStats, LayerCacheClient};
pub use providers::MemoryCacheProvider;
pub use reader::CachedLayerReader;
pub use traits::{BoxFuture, Cache, CacheError};
