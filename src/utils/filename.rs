use chrono::NaiveDate;

use crate::error::Result;
use crate::models::fetch_unit::{stream_number, FetchUnit, GridBounds};

/// On-disk name of a fetch unit's raw grid file. The name is the unit's
/// identity: database, day and bounding box, in the MERRA-2 style
/// `MERRA2_{stream}.{database_id}.{YYYYMMDD}.L{a}-{b}.X{c}-{d}.json`.
pub fn grid_file_name(unit: &FetchUnit) -> Result<String> {
    let stream = stream_number(unit.year())?;
    Ok(format!(
        "MERRA2_{}.{}.{}.L{}-{}.X{}-{}.json",
        stream,
        unit.variable.database_id,
        unit.date.format("%Y%m%d"),
        unit.bounds.lat_min,
        unit.bounds.lat_max,
        unit.bounds.lon_min,
        unit.bounds.lon_max,
    ))
}

/// Identity recovered from a raw grid file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGridFileName {
    pub database_id: String,
    pub date: NaiveDate,
    pub bounds: GridBounds,
}

/// Parse a grid file name back into its unit identity. Returns `None`
/// for names that do not follow the scheme (foreign files are skipped,
/// not treated as errors).
pub fn parse_grid_file_name(name: &str) -> Option<ParsedGridFileName> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 6 || parts[5] != "json" || !parts[0].starts_with("MERRA2_") {
        return None;
    }

    let database_id = parts[1].to_string();
    let date = NaiveDate::parse_from_str(parts[2], "%Y%m%d").ok()?;

    let parse_range = |segment: &str, prefix: char| -> Option<(usize, usize)> {
        let rest = segment.strip_prefix(prefix)?;
        let (a, b) = rest.split_once('-')?;
        Some((a.parse().ok()?, b.parse().ok()?))
    };

    let (lat_min, lat_max) = parse_range(parts[3], 'L')?;
    let (lon_min, lon_max) = parse_range(parts[4], 'X')?;

    Some(ParsedGridFileName {
        database_id,
        date,
        bounds: GridBounds {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        },
    })
}
