//! Domain-specific cache clients.
//!
//! Clients wrap the generic [`Cache`](super::Cache) with key translation,
//! value encoding and hit/miss accounting.
//!
//! ```text
//! ┌──────────────────────────┐
//! │    LayerCacheClient      │
//! │                          │
//! │ (layer, zoom, ..) → key  │
//! │ bincode encode / decode  │
//! │ hit / miss counters      │
//! └────────────┬─────────────┘
//!              ▼
//! ┌──────────────────────────┐
//! │      Arc<dyn Cache>      │
//! │  string → Vec<u8> store  │
//! └──────────────────────────┘
//! ```
//!
//! # Key Formats
//!
//! - Max zoom: `maxzoom:{layer}`
//! - Metadata: `meta:{layer}:{zoom}`
//! - Tile: `tile:{layer}:{zoom}:{col}:{row}`
//! - Histogram: `hist:{layer}:{zoom}`
//! - Extent: `extent:{layer}:{zoom}:{xmin}:{ymin}:{xmax}:{ymax}`

mod layer;

pub use layer::{CacheStats, LayerCacheClient};
