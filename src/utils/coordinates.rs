use crate::error::{ProcessingError, Result};
use crate::utils::constants::{GRID_LAT_POINTS, GRID_LAT_STEP, GRID_LON_POINTS, GRID_LON_STEP};

/// Parse a decimal-degree coordinate value.
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();
    trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
    })
}

/// Translate a latitude in decimal degrees to the nearest GEOS-5 native
/// grid index.
///
/// The grid spans -90..90 in 0.5 degree steps; index 0 is -90. The
/// formula comes from the MERRA-2 file specification for GEOS.
pub fn lat_to_grid_index(latitude: f64) -> usize {
    let raw = (latitude + 90.0) / GRID_LAT_STEP;
    (raw.round().max(0.0) as usize).min(GRID_LAT_POINTS - 1)
}

/// Translate a longitude in decimal degrees to the nearest GEOS-5 native
/// grid index. The grid spans -180..180 in 0.625 degree steps.
pub fn lon_to_grid_index(longitude: f64) -> usize {
    let raw = (longitude + 180.0) / GRID_LON_STEP;
    (raw.round().max(0.0) as usize).min(GRID_LON_POINTS - 1)
}

/// Inverse of the index translation: the real-world coordinate of a grid
/// index. Used when labelling subset requests.
pub fn grid_index_to_lat(index: usize) -> f64 {
    index as f64 * GRID_LAT_STEP - 90.0
}

pub fn grid_index_to_lon(index: usize) -> f64 {
    index as f64 * GRID_LON_STEP - 180.0
}
