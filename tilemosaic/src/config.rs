//! INI configuration file.
//!
//! ```ini
//! [cache]
//! memory_size = 512MB
//! ttl_secs = 3600
//!
//! [pool]
//! threads = 8
//!
//! [render]
//! tile_size = 256
//! bbox_crs = 4326
//! render_crs = 3857
//! ```
//!
//! Every key is optional; missing keys keep their defaults. Sizes accept
//! `KB`, `MB` and `GB` suffixes (binary multiples).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::coord::{LAT_LNG, WEB_MERCATOR};
use crate::raster::TILE_SIZE;

/// Default in-memory cache size: 512 MB.
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 512 * 1024 * 1024;

/// Errors loading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// In-memory cache capacity in bytes.
    pub memory_size: usize,
    /// Entry time-to-live; `None` keeps entries until evicted.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_CACHE_SIZE,
            ttl_secs: None,
        }
    }
}

/// `[pool]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSettings {
    /// Blocking pool size; `None` sizes from the available CPUs.
    pub threads: Option<usize>,
}

/// `[render]` section: output geometry and coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Output tile edge length in pixels.
    pub tile_size: u32,
    /// EPSG code of bounding boxes given to extent renders.
    pub bbox_crs: i32,
    /// EPSG code extent renders are performed in.
    pub render_crs: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            bbox_crs: LAT_LNG,
            render_crs: WEB_MERCATOR,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub pool: PoolSettings,
    pub render: RenderConfig,
}

impl ConfigFile {
    /// Load and parse an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&contents)
    }

    /// Parse INI text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(value) = get(&ini, "cache", "memory_size") {
            config.cache.memory_size =
                parse_size(value).map_err(|reason| invalid("cache", "memory_size", value, reason))?;
        }
        if let Some(value) = get(&ini, "cache", "ttl_secs") {
            config.cache.ttl_secs = Some(parse_number("cache", "ttl_secs", value)?);
        }
        if let Some(value) = get(&ini, "pool", "threads") {
            let threads: usize = parse_number("pool", "threads", value)?;
            if threads == 0 {
                return Err(invalid("pool", "threads", value, "must be at least 1".to_string()));
            }
            config.pool.threads = Some(threads);
        }
        if let Some(value) = get(&ini, "render", "tile_size") {
            let size: u32 = parse_number("render", "tile_size", value)?;
            if size == 0 {
                return Err(invalid("render", "tile_size", value, "must be at least 1".to_string()));
            }
            config.render.tile_size = size;
        }
        if let Some(value) = get(&ini, "render", "bbox_crs") {
            config.render.bbox_crs = parse_number("render", "bbox_crs", value)?;
        }
        if let Some(value) = get(&ini, "render", "render_crs") {
            config.render.render_crs = parse_number("render", "render_crs", value)?;
        }

        Ok(config)
    }
}

fn get<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_number<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| invalid(section, key, value, e.to_string()))
}

fn invalid(section: &str, key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

/// Parse a size such as `512MB`, `2 GB`, `64kb` or `1048576` into bytes.
pub fn parse_size(input: &str) -> Result<usize, String> {
    let s = input.trim();
    let upper = s.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value: usize = digits
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a size", s))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{}' is too large", s))
}

/// Format a byte count for display, e.g. `1.5 GB`.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [(&str, usize); 3] = [("GB", 1024 * 1024 * 1024), ("MB", 1024 * 1024), ("KB", 1024)];
    for (unit, size) in UNITS {
        if bytes >= size {
            return format!("{:.1} {}", bytes as f64 / size as f64, unit);
        }
    }
    format!("{} B", bytes)
}
