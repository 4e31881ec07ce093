//! Arguments and helpers shared across render commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tilemosaic::app::{MosaicConfig, MosaicService};
use tilemosaic::config::ConfigFile;
use tilemosaic::project::{MemoryProjectStore, Project};
use tilemosaic::store::FsLayerStore;
use tilemosaic::Tile;

use crate::error::CliError;

/// Inputs every render needs.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Root directory of the layer store
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,

    /// Project definition (JSON)
    #[arg(long, value_name = "FILE")]
    pub project: PathBuf,

    /// Zoom level to render
    #[arg(long)]
    pub zoom: u8,

    /// Output PNG path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

/// Load the config file, falling back to defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => ConfigFile::load(path).map_err(|e| CliError::Config(e.to_string())),
        None => Ok(ConfigFile::default()),
    }
}

/// Build a service over the store directory serving the one project file.
///
/// Returns the service and the project's id.
pub fn build_service(config: &ConfigFile, source: &SourceArgs) -> Result<(MosaicService, String), CliError> {
    let project = Project::load(&source.project).map_err(|e| CliError::Project(e.to_string()))?;
    let project_id = project.id.clone();

    let mut projects = MemoryProjectStore::new();
    projects.insert(project);

    let store = Arc::new(FsLayerStore::new(&source.store));
    let service = MosaicService::with_layer_store(
        &MosaicConfig::from_config_file(config),
        store,
        Arc::new(projects),
    )
    .map_err(|e| CliError::Startup(e.to_string()))?;

    Ok((service, project_id))
}

/// Encode `tile` as PNG and write it to `path`.
///
/// RGBA tiles are written as colour; single-band tiles are stretched to
/// greyscale.
pub fn write_png(tile: &Tile, path: &Path) -> Result<usize, CliError> {
    let bytes = if tile.band_count() == 4 {
        tile.encode_png()
    } else {
        tile.encode_gray_png(0)
    }
    .map_err(|e| CliError::Render(e.into()))?;

    std::fs::write(path, &bytes).map_err(|e| CliError::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(bytes.len())
}
