//! Mosaic compositing across a project's scenes.
//!
//! Scene fetches fan out concurrently and are re-ordered by scene index
//! before merging, so results never depend on completion order.
//!
//! Failure policy: a failing scene is logged and skipped. Only when no
//! scene produced data does the first failure (in project order) surface
//! as the result. No data and no failures is an empty result.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::try_join;
use tracing::{debug, instrument, warn};

use crate::cache::CachedLayerReader;
use crate::color::{colorize, SingleBandOptions};
use crate::config::RenderConfig;
use crate::coord::CrsExtent;
use crate::project::{MosaicDefinition, Project};
use crate::raster::{Histogram, Tile};

use super::bbox::parse_bbox;
use super::extent::ExtentFetcher;
use super::fetch::TileFetcher;
use super::resolver::MetadataResolver;
use super::{FetchResult, MosaicError};

type ScenePair = (Tile, Vec<Histogram>);

/// Composes project tiles from per-scene pyramids.
pub struct Compositor {
    reader: Arc<CachedLayerReader>,
    resolver: MetadataResolver,
    tiles: TileFetcher,
    extents: ExtentFetcher,
    bbox_crs: i32,
    render_crs: i32,
}

impl Compositor {
    pub fn new(reader: Arc<CachedLayerReader>, render: &RenderConfig) -> Self {
        Self {
            resolver: MetadataResolver::new(Arc::clone(&reader)),
            tiles: TileFetcher::new(Arc::clone(&reader), render.tile_size),
            extents: ExtentFetcher::new(Arc::clone(&reader), render.tile_size),
            reader,
            bbox_crs: render.bbox_crs,
            render_crs: render.render_crs,
        }
    }

    pub fn reader(&self) -> &Arc<CachedLayerReader> {
        &self.reader
    }

    /// Render the XYZ tile (`zoom`, `col`, `row`) of a project.
    ///
    /// Every scene with both a tile and histograms at its effective zoom
    /// contributes; the contributions are colour-ramped together.
    #[instrument(skip(self, project), fields(project = %project.id))]
    pub async fn compose_pixel(&self, project: &Project, zoom: u8, col: u32, row: u32) -> FetchResult<Tile> {
        let options = render_options(project)?;

        let results = project
            .scenes
            .iter()
            .enumerate()
            .map(|(idx, scene)| async move { (idx, self.scene_pixel(scene, options.band, zoom, col, row).await) })
            .collect::<FuturesUnordered<_>>()
            .collect::<Vec<_>>()
            .await;

        let pairs = settle(project, results)?;
        if pairs.is_empty() {
            return Ok(None);
        }
        Ok(Some(colorize(&pairs, options)?))
    }

    /// Render a project over a bounding box.
    ///
    /// `bbox` is `"xmin,ymin,xmax,ymax"` in the configured input CRS;
    /// without it each scene's full layout is used. With `color_correct`
    /// the scenes are colour-ramped together; otherwise the render band is
    /// extracted and merged in project order, later scenes drawing over
    /// earlier ones.
    #[instrument(skip(self, project), fields(project = %project.id))]
    pub async fn compose_extent(
        &self,
        project: &Project,
        zoom: u8,
        bbox: Option<&str>,
        color_correct: bool,
    ) -> FetchResult<Tile> {
        let extent = match bbox {
            Some(raw) => {
                let parsed = parse_bbox(raw)?;
                Some(CrsExtent::new(parsed, self.bbox_crs).reproject(self.render_crs)?)
            }
            None => None,
        };
        let options = render_options(project)?;

        let results = project
            .scenes
            .iter()
            .enumerate()
            .map(|(idx, scene)| async move { (idx, self.scene_extent(scene, options.band, zoom, extent).await) })
            .collect::<FuturesUnordered<_>>()
            .collect::<Vec<_>>()
            .await;

        let pairs = settle(project, results)?;
        if pairs.is_empty() {
            return Ok(None);
        }

        if color_correct {
            return Ok(Some(colorize(&pairs, options)?));
        }

        let mut merged: Option<Tile> = None;
        for (tile, _) in &pairs {
            let band = tile.band(options.band)?;
            merged = Some(match merged {
                None => band,
                Some(under) => under.overlay(&band)?,
            });
        }
        Ok(merged)
    }

    async fn scene_pixel(
        &self,
        scene: &MosaicDefinition,
        band: usize,
        zoom: u8,
        col: u32,
        row: u32,
    ) -> FetchResult<ScenePair> {
        let layer = &scene.scene_id;
        let Some(resolved) = self.resolver.resolve(layer, zoom).await? else {
            return Ok(None);
        };

        let (tile, histograms) = try_join!(
            self.tiles.fetch_resolved(layer, &resolved, zoom, col, row),
            self.reader.histogram(layer, resolved.zoom),
        )?;

        let Some(tile) = tile else {
            return Ok(None);
        };
        Ok(with_band_histogram(scene, band, tile, histograms))
    }

    async fn scene_extent(
        &self,
        scene: &MosaicDefinition,
        band: usize,
        zoom: u8,
        extent: Option<CrsExtent>,
    ) -> FetchResult<ScenePair> {
        let Some((tile, histograms)) = self
            .extents
            .fetch_for_extent(&scene.scene_id, zoom, extent)
            .await?
        else {
            return Ok(None);
        };
        Ok(with_band_histogram(scene, band, tile, histograms))
    }
}

/// Pair a scene's tile with its histograms after the scene's clip is
/// applied to both. A scene without a histogram for the render band does
/// not contribute.
fn with_band_histogram(scene: &MosaicDefinition, band: usize, tile: Tile, histograms: Vec<Histogram>) -> Option<ScenePair> {
    if histograms.get(band).is_none() {
        debug!(scene = %scene.scene_id, band, "Scene has no histogram for band, dropped");
        return None;
    }
    let params = &scene.color_correction;
    let histograms = histograms.iter().map(|hist| params.apply_histogram(hist)).collect();
    Some((params.apply(tile), histograms))
}

fn render_options(project: &Project) -> Result<&SingleBandOptions, MosaicError> {
    project
        .single_band_options
        .as_ref()
        .ok_or_else(|| MosaicError::MissingRenderOptions {
            project: project.id.clone(),
        })
}

/// Apply the failure policy to per-scene results, returning contributing
/// scenes in project order.
fn settle<T>(project: &Project, mut results: Vec<(usize, FetchResult<T>)>) -> Result<Vec<T>, MosaicError> {
    results.sort_by_key(|(idx, _)| *idx);

    let mut contributed = Vec::with_capacity(results.len());
    let mut first_failure = None;
    for (idx, result) in results {
        let scene = &project.scenes[idx].scene_id;
        match result {
            Ok(Some(value)) => contributed.push(value),
            Ok(None) => debug!(scene = %scene, "Scene has no data, dropped"),
            Err(e) => {
                warn!(scene = %scene, error = %e, "Scene fetch failed, skipping");
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) if contributed.is_empty() => Err(e),
        _ => Ok(contributed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorCorrectParams;
    use crate::store::StoreError;

    fn project(scenes: &[&str]) -> Project {
        scenes
            .iter()
            .fold(Project::new("p"), |p, s| p.with_scene(MosaicDefinition::new(*s)))
    }

    fn store_failure(layer: &str) -> MosaicError {
        MosaicError::Store(StoreError::Backend(format!("{} down", layer)))
    }

    #[test]
    fn test_settle_orders_by_scene_index() {
        let p = project(&["a", "b", "c"]);
        let results = vec![(2, Ok(Some('c'))), (0, Ok(Some('a'))), (1, Ok(Some('b')))];
        assert_eq!(settle(&p, results).unwrap(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_settle_skips_failures_when_others_contribute() {
        let p = project(&["a", "b"]);
        let results = vec![(0, Err(store_failure("a"))), (1, Ok(Some(1)))];
        assert_eq!(settle(&p, results).unwrap(), vec![1]);
    }

    #[test]
    fn test_settle_returns_first_failure_in_project_order() {
        let p = project(&["a", "b", "c"]);
        let results: Vec<(usize, FetchResult<u8>)> = vec![
            (2, Err(store_failure("c"))),
            (1, Err(store_failure("b"))),
            (0, Ok(None)),
        ];
        let err = settle(&p, results).unwrap_err();
        assert_eq!(err.to_string(), "Store backend error: b down");
    }

    #[test]
    fn test_settle_empty_without_failures() {
        let p = project(&["a"]);
        let results: Vec<(usize, FetchResult<u8>)> = vec![(0, Ok(None))];
        assert!(settle(&p, results).unwrap().is_empty());
    }

    #[test]
    fn test_render_options_required() {
        let err = render_options(&project(&["a"])).unwrap_err();
        assert!(matches!(err, MosaicError::MissingRenderOptions { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_scene_without_band_histogram_is_dropped() {
        let scene = MosaicDefinition::new("a");
        let tile = Tile::filled(4, 4, 2, 1.0);

        assert!(with_band_histogram(&scene, 0, tile.clone(), vec![]).is_none());

        let one_band = vec![Histogram::from_samples(&[1.0])];
        assert!(with_band_histogram(&scene, 1, tile.clone(), one_band.clone()).is_none());
        assert!(with_band_histogram(&scene, 0, tile, one_band).is_some());
    }

    #[test]
    fn test_scene_clip_applies_to_histograms() {
        let scene = MosaicDefinition::new("a").with_color_correction(ColorCorrectParams::clipped(0.0, 10.0));
        let tile = Tile::new(2, 1, vec![vec![-3.0, 40.0]]).unwrap();
        let hist = Histogram::from_samples(tile.band_data(0).unwrap());

        let (tile, hists) = with_band_histogram(&scene, 0, tile, vec![hist]).unwrap();

        assert_eq!(tile.get(0, 1, 0), 10.0);
        assert_eq!(hists[0].max_value(), Some(10.0));
        assert_eq!(hists[0].min_value(), Some(0.0));
    }
}
