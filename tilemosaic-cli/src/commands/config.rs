//! Configuration inspection commands.

use clap::Subcommand;
use tilemosaic::config::{format_size, ConfigFile};

use crate::error::CliError;

/// Config action subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(config: &ConfigFile, action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            println!("[cache]");
            println!("  memory_size: {}", format_size(config.cache.memory_size));
            match config.cache.ttl_secs {
                Some(ttl) => println!("  ttl_secs:    {}", ttl),
                None => println!("  ttl_secs:    none"),
            }
            println!("[pool]");
            match config.pool.threads {
                Some(threads) => println!("  threads:     {}", threads),
                None => println!("  threads:     auto"),
            }
            println!("[render]");
            println!("  tile_size:   {}", config.render.tile_size);
            println!("  bbox_crs:    EPSG:{}", config.render.bbox_crs);
            println!("  render_crs:  EPSG:{}", config.render.render_crs);
            Ok(())
        }
    }
}
