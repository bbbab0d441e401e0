use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::Location;
use crate::utils::coordinates::parse_coordinate;

#[derive(Debug, Deserialize)]
struct RawLocationRecord {
    name: String,
    latitude: String,
    longitude: String,
}

/// Loads the location list CSV (`name,latitude,longitude`).
pub struct LocationReader;

impl LocationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_locations(&self, path: &Path) -> Result<Vec<Location>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut locations = Vec::new();
        let mut seen = HashSet::new();

        for record in reader.deserialize() {
            let raw: RawLocationRecord = record?;

            if !seen.insert(raw.name.clone()) {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Duplicate location name: '{}'",
                    raw.name
                )));
            }

            let location = Location::new(
                raw.name,
                parse_coordinate(&raw.latitude)?,
                parse_coordinate(&raw.longitude)?,
            );
            location.validate()?;
            locations.push(location);
        }

        if locations.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "No locations found in {}",
                path.display()
            )));
        }

        Ok(locations)
    }
}

impl Default for LocationReader {
    fn default() -> Self {
        Self::new()
    }
}
