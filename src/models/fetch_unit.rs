use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

use crate::error::{ProcessingError, Result};
use crate::models::{Location, VariableSpec};
use crate::utils::coordinates::{lat_to_grid_index, lon_to_grid_index};

/// Inclusive MERRA-2 grid index box covering one or more locations.
///
/// Indices follow the GEOS-5 native grid: latitude 0..=360, longitude
/// 0..=575.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridBounds {
    pub lat_min: usize,
    pub lat_max: usize,
    pub lon_min: usize,
    pub lon_max: usize,
}

impl GridBounds {
    /// Compute the smallest index box covering all given locations.
    pub fn covering(locations: &[Location]) -> Result<Self> {
        if locations.is_empty() {
            return Err(ProcessingError::Config(
                "At least one location is required".to_string(),
            ));
        }

        let mut bounds = GridBounds {
            lat_min: usize::MAX,
            lat_max: 0,
            lon_min: usize::MAX,
            lon_max: 0,
        };

        for loc in locations {
            let lat = lat_to_grid_index(loc.latitude);
            let lon = lon_to_grid_index(loc.longitude);
            bounds.lat_min = bounds.lat_min.min(lat);
            bounds.lat_max = bounds.lat_max.max(lat);
            bounds.lon_min = bounds.lon_min.min(lon);
            bounds.lon_max = bounds.lon_max.max(lon);
        }

        Ok(bounds)
    }
}

/// The file-number component of MERRA-2 file names. It changes with the
/// reprocessing era: 100 for 1980-1991, 200 for 1992-2000, 300 for
/// 2001-2010 and 400 from 2011 onwards.
pub fn stream_number(year: i32) -> Result<&'static str> {
    match year {
        1980..=1991 => Ok("100"),
        1992..=2000 => Ok("200"),
        2001..=2010 => Ok("300"),
        y if y >= 2011 => Ok("400"),
        y => Err(ProcessingError::YearOutOfRange(y)),
    }
}

/// One remote subset file to fetch: a (variable, day, bounding box)
/// combination. Location-independent; the box covers every requested
/// location at once.
#[derive(Debug, Clone)]
pub struct FetchUnit {
    pub variable: VariableSpec,
    pub date: NaiveDate,
    pub bounds: GridBounds,
}

impl FetchUnit {
    pub fn new(variable: VariableSpec, date: NaiveDate, bounds: GridBounds) -> Self {
        Self {
            variable,
            date,
            bounds,
        }
    }

    /// Identity of the unit: two units with the same key fetch the same
    /// remote file.
    pub fn key(&self) -> (String, NaiveDate, GridBounds) {
        (self.variable.database_id.clone(), self.date, self.bounds)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Short human-readable label for logs and run summaries.
    pub fn label(&self) -> String {
        format!("{} {}", self.variable.database_id, self.date)
    }
}

/// Terminal outcome of one fetch unit. Transient failures are not
/// terminal; they requeue inside the scheduler and surface here only
/// once the retry budget turns them permanent.
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    Success(PathBuf),
    PermanentFailure(String),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub unit: FetchUnit,
    pub outcome: DownloadOutcome,
    pub attempts: u32,
}
