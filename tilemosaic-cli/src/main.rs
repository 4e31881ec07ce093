//! TileMosaic CLI - render composited mosaic tiles to PNG
//!
//! ```text
//! tilemosaic render-pixel  --store DIR --project FILE --zoom Z --col X --row Y -o out.png
//! tilemosaic render-extent --store DIR --project FILE --zoom Z [--bbox B] [--color-correct] -o out.png
//! tilemosaic config show
//! ```
//!
//! Exit status: 0 on success (including an empty render), 2 for a rejected
//! request, 1 for any other failure.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use commands::common::load_config;
use commands::config::ConfigAction;
use commands::render::{ExtentArgs, PixelArgs};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "tilemosaic", version, about = "Render composited raster mosaic tiles")]
struct Cli {
    /// INI configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "tilemosaic=debug" (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render one XYZ tile of a project
    RenderPixel(PixelArgs),
    /// Render a project over a bounding box
    RenderExtent(ExtentArgs),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match tilemosaic::logging::init(&cli.log_level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => return report(CliError::Config(e.to_string())),
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::RenderPixel(args) => commands::render::run_pixel(&config, args).await.map(|_| ()),
        Commands::RenderExtent(args) => commands::render::run_extent(&config, args).await.map(|_| ()),
        Commands::Config { action } => commands::config::run(&config, action),
    }
}

fn report(e: CliError) -> ExitCode {
    error!(error = %e, "Command failed");
    eprintln!("Error: {}", e);
    ExitCode::from(e.exit_code() as u8)
}
