//! Project-level render service.

use std::sync::Arc;

use tracing::{debug, info};

use super::config::MosaicConfig;
use super::error::AppError;
use crate::cache::{Cache, CacheStats, CachedLayerReader, MemoryCacheProvider};
use crate::executor::BlockingPool;
use crate::mosaic::{Compositor, FetchResult, MosaicError};
use crate::project::{Project, ProjectProvider};
use crate::raster::Tile;
use crate::store::{AttributeStore, TileStore};

/// Renders mosaic tiles for projects looked up by id.
///
/// Owns the shared cache and blocking pool; build it once and share it
/// behind an `Arc`.
pub struct MosaicService {
    projects: Arc<dyn ProjectProvider>,
    compositor: Compositor,
    cache: Arc<dyn Cache>,
    pool: Arc<BlockingPool>,
}

impl MosaicService {
    /// Assemble the service over separate attribute and tile stores.
    pub fn new(
        config: &MosaicConfig,
        attributes: Arc<dyn AttributeStore>,
        tiles: Arc<dyn TileStore>,
        projects: Arc<dyn ProjectProvider>,
    ) -> Result<Self, AppError> {
        if config.memory_cache.max_size_bytes == 0 {
            return Err(AppError::Config("memory cache size must be non-zero".to_string()));
        }

        let pool = Arc::new(match config.pool_threads {
            Some(threads) => BlockingPool::new(threads, "tilemosaic-store")?,
            None => BlockingPool::with_defaults("tilemosaic-store")?,
        });
        let cache: Arc<dyn Cache> = Arc::new(MemoryCacheProvider::new(
            config.memory_cache.max_size_bytes,
            config.memory_cache.ttl,
        ));
        let reader = Arc::new(CachedLayerReader::new(
            attributes,
            tiles,
            Arc::clone(&cache),
            Arc::clone(&pool),
        ));

        info!(
            tile_size = config.render.tile_size,
            bbox_crs = config.render.bbox_crs,
            render_crs = config.render.render_crs,
            pool_threads = pool.threads(),
            "Mosaic service ready"
        );

        Ok(Self {
            projects,
            compositor: Compositor::new(reader, &config.render),
            cache,
            pool,
        })
    }

    /// Assemble the service over one store serving both attributes and tiles.
    pub fn with_layer_store<S>(
        config: &MosaicConfig,
        store: Arc<S>,
        projects: Arc<dyn ProjectProvider>,
    ) -> Result<Self, AppError>
    where
        S: AttributeStore + TileStore + 'static,
    {
        let attributes: Arc<dyn AttributeStore> = store.clone();
        Self::new(config, attributes, store, projects)
    }

    /// Render XYZ tile (`zoom`, `col`, `row`) of a project.
    pub async fn render_pixel(&self, project_id: &str, zoom: u8, col: u32, row: u32) -> FetchResult<Tile> {
        let project = self.load_project(project_id).await?;
        self.compositor.compose_pixel(&project, zoom, col, row).await
    }

    /// Render a project over an optional `"xmin,ymin,xmax,ymax"` bounding box.
    pub async fn render_extent(
        &self,
        project_id: &str,
        zoom: u8,
        bbox: Option<&str>,
        color_correct: bool,
    ) -> FetchResult<Tile> {
        let project = self.load_project(project_id).await?;
        self.compositor
            .compose_extent(&project, zoom, bbox, color_correct)
            .await
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.compositor.reader().stats()
    }

    /// Bytes currently held by the layer cache.
    pub fn cache_size_bytes(&self) -> u64 {
        self.cache.size_bytes()
    }

    pub fn pool(&self) -> &Arc<BlockingPool> {
        &self.pool
    }

    async fn load_project(&self, project_id: &str) -> Result<Project, MosaicError> {
        match self.projects.project(project_id).await? {
            Some(project) => {
                debug!(project = %project_id, scenes = project.scenes.len(), "Loaded project");
                Ok(project)
            }
            None => Err(MosaicError::ProjectNotFound(project_id.to_string())),
        }
    }
}
