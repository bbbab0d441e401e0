use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::MISSING_FILL_VALUE;

fn default_missing_value() -> f64 {
    MISSING_FILL_VALUE
}

/// Decoded contents of one raw grid file: a per-day hourly subset of one
/// field over a small coordinate box.
///
/// `values` is indexed `[time][lat][lon]`; cells are either absent
/// (JSON null) or carry the archive's fill value when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSubset {
    pub database_id: String,
    pub field_id: String,
    pub date: NaiveDate,
    pub time_hours: Vec<u32>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    #[serde(default = "default_missing_value")]
    pub missing_value: f64,
    pub values: Vec<Vec<Vec<Option<f64>>>>,
}

impl GridSubset {
    /// Value of a cell, or `None` for missing/fill/non-finite entries.
    pub fn value_at(&self, time_idx: usize, lat_idx: usize, lon_idx: usize) -> Option<f64> {
        let v = *self
            .values
            .get(time_idx)?
            .get(lat_idx)?
            .get(lon_idx)?
            .as_ref()?;
        if !v.is_finite() || v.abs() >= self.missing_value / 2.0 {
            None
        } else {
            Some(v)
        }
    }

    /// UTC timestamp of a timestep index.
    pub fn timestamp(&self, time_idx: usize) -> Option<NaiveDateTime> {
        let hour = *self.time_hours.get(time_idx)?;
        self.date.and_hms_opt(hour, 0, 0)
    }

    /// True if at least one cell of the subset holds a real observation.
    pub fn has_any_observation(&self) -> bool {
        (0..self.time_hours.len()).any(|t| {
            (0..self.latitudes.len())
                .any(|la| (0..self.longitudes.len()).any(|lo| self.value_at(t, la, lo).is_some()))
        })
    }
}

pub struct GridReader;

impl GridReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and shape-check a grid subset file.
    pub fn read(&self, path: &Path) -> Result<GridSubset> {
        let file = File::open(path)?;
        let subset: GridSubset = serde_json::from_reader(BufReader::new(file))?;
        self.check_shape(&subset, path)?;
        Ok(subset)
    }

    fn check_shape(&self, subset: &GridSubset, path: &Path) -> Result<()> {
        if subset.values.len() != subset.time_hours.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "{}: {} time slices declared but {} present",
                path.display(),
                subset.time_hours.len(),
                subset.values.len()
            )));
        }

        for slice in &subset.values {
            if slice.len() != subset.latitudes.len()
                || slice.iter().any(|row| row.len() != subset.longitudes.len())
            {
                return Err(ProcessingError::InvalidFormat(format!(
                    "{}: value grid does not match declared coordinate axes",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for GridReader {
    fn default() -> Self {
        Self::new()
    }
}
