//! Coordinate reprojection between EPSG-coded reference systems.
//!
//! Geographic <-> Web Mercator uses closed-form math. Everything else goes
//! through `proj4rs` with projection strings from `crs-definitions`.

use std::f64::consts::PI;

use thiserror::Error;

use super::{Extent, HALF_EARTH, MAX_LAT};

/// EPSG code for WGS84 longitude/latitude.
pub const LAT_LNG: i32 = 4326;

/// EPSG code for spherical Web Mercator.
pub const WEB_MERCATOR: i32 = 3857;

/// Errors raised while reprojecting coordinates.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    /// The EPSG code has no entry in the projection database.
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnsupportedCrs(i32),

    /// The projection string could not be parsed.
    #[error("Invalid projection EPSG:{epsg}: {reason}")]
    InvalidProjection { epsg: i32, reason: String },

    /// The transform itself failed (point outside projection domain, etc.).
    #[error("Transform from EPSG:{from} to EPSG:{to} failed: {reason}")]
    TransformFailed { from: i32, to: i32, reason: String },
}

/// Project a single point from one CRS to another.
pub fn project_point(source: i32, target: i32, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    match (source, target) {
        (s, t) if s == t => Ok((x, y)),
        (LAT_LNG, WEB_MERCATOR) => Ok(lon_lat_to_mercator(x, y)),
        (WEB_MERCATOR, LAT_LNG) => Ok(mercator_to_lon_lat(x, y)),
        _ => project_with_proj4rs(source, target, x, y),
    }
}

/// Reproject an extent, returning the bounding box of its projected corners.
pub fn reproject_extent(extent: &Extent, source: i32, target: i32) -> Result<Extent, ProjectionError> {
    if source == target {
        return Ok(*extent);
    }

    let corners = [
        (extent.xmin, extent.ymin),
        (extent.xmin, extent.ymax),
        (extent.xmax, extent.ymin),
        (extent.xmax, extent.ymax),
    ];

    let mut out = Extent::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        let (px, py) = project_point(source, target, x, y)?;
        out.xmin = out.xmin.min(px);
        out.ymin = out.ymin.min(py);
        out.xmax = out.xmax.max(px);
        out.ymax = out.ymax.max(py);
    }
    Ok(out)
}

/// Check if an EPSG code represents a geographic (lon/lat) CRS.
pub fn is_geographic_crs(epsg: i32) -> bool {
    match proj_string(epsg) {
        Some(proj) => proj.contains("+proj=longlat"),
        None => epsg == LAT_LNG,
    }
}

#[inline]
fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LAT, MAX_LAT);
    let x = lon * HALF_EARTH / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() * HALF_EARTH / PI;
    (x, y)
}

#[inline]
fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 180.0 / HALF_EARTH;
    let y_rad = y * PI / HALF_EARTH;
    let lat = (2.0 * y_rad.exp().atan() - PI / 2.0) * 180.0 / PI;
    (lon, lat)
}

fn proj_string(epsg: i32) -> Option<&'static str> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

fn parse_proj(epsg: i32) -> Result<proj4rs::proj::Proj, ProjectionError> {
    let proj = proj_string(epsg).ok_or(ProjectionError::UnsupportedCrs(epsg))?;
    proj4rs::proj::Proj::from_proj_string(proj).map_err(|e| ProjectionError::InvalidProjection {
        epsg,
        reason: format!("{:?}", e),
    })
}

fn project_with_proj4rs(source: i32, target: i32, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
    let source_proj = parse_proj(source)?;
    let target_proj = parse_proj(target)?;

    // proj4rs works in radians for geographic systems
    let mut point = if is_geographic_crs(source) {
        (x.to_radians(), y.to_radians(), 0.0)
    } else {
        (x, y, 0.0)
    };

    proj4rs::transform::transform(&source_proj, &target_proj, &mut point).map_err(|e| {
        ProjectionError::TransformFailed {
            from: source,
            to: target,
            reason: format!("{:?}", e),
        }
    })?;

    if is_geographic_crs(target) {
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    } else {
        Ok((point.0, point.1))
    }
}
