//! Render commands.

use clap::Args;
use tilemosaic::config::{format_size, ConfigFile};
use tracing::info;

use super::common::{build_service, write_png, SourceArgs};
use crate::error::CliError;

/// Arguments for `render-pixel`.
#[derive(Debug, Args)]
pub struct PixelArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Tile column
    #[arg(long)]
    pub col: u32,

    /// Tile row
    #[arg(long)]
    pub row: u32,
}

/// Arguments for `render-extent`.
#[derive(Debug, Args)]
pub struct ExtentArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Bounding box "xmin,ymin,xmax,ymax" in the configured bbox CRS
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Apply a shared colour ramp across scenes
    #[arg(long)]
    pub color_correct: bool,
}

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    NoContent,
}

pub async fn run_pixel(config: &ConfigFile, args: PixelArgs) -> Result<Outcome, CliError> {
    let (service, project_id) = build_service(config, &args.source)?;
    let source = &args.source;

    let tile = service
        .render_pixel(&project_id, source.zoom, args.col, args.row)
        .await?;

    let Some(tile) = tile else {
        println!("No content for {}/{}/{}", source.zoom, args.col, args.row);
        return Ok(Outcome::NoContent);
    };

    let size = write_png(&tile, &source.output)?;
    info!(cache = ?service.cache_stats(), "Render complete");
    println!("Wrote {} ({})", source.output.display(), format_size(size));
    Ok(Outcome::Written)
}

pub async fn run_extent(config: &ConfigFile, args: ExtentArgs) -> Result<Outcome, CliError> {
    let (service, project_id) = build_service(config, &args.source)?;
    let source = &args.source;

    let tile = service
        .render_extent(&project_id, source.zoom, args.bbox.as_deref(), args.color_correct)
        .await?;

    let Some(tile) = tile else {
        println!("No content for zoom {}", source.zoom);
        return Ok(Outcome::NoContent);
    };

    let size = write_png(&tile, &source.output)?;
    info!(cache = ?service.cache_stats(), "Render complete");
    println!("Wrote {} ({})", source.output.display(), format_size(size));
    Ok(Outcome::Written)
}
