use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::{Aggregator, ConversionRule, VariableSpec};

#[derive(Debug, Deserialize)]
struct RawCatalogRecord {
    name: String,
    field_id: String,
    database_name: String,
    database_id: String,
    conversion: String,
    aggregator: String,
}

/// Loads the variable catalog CSV
/// (`name,field_id,database_name,database_id,conversion,aggregator`).
pub struct CatalogReader;

impl CatalogReader {
    pub fn new() -> Self {
        Self
    }

    /// Read the catalog, preserving order and rejecting duplicate names.
    pub fn read_catalog(&self, path: &Path) -> Result<Vec<VariableSpec>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut variables = Vec::new();
        let mut seen = HashSet::new();

        for record in reader.deserialize() {
            let raw: RawCatalogRecord = record?;

            if !seen.insert(raw.name.clone()) {
                return Err(ProcessingError::InvalidCatalog(format!(
                    "Duplicate variable name: '{}'",
                    raw.name
                )));
            }

            let variable = VariableSpec {
                name: raw.name,
                field_id: raw.field_id,
                database_name: raw.database_name,
                database_id: raw.database_id,
                conversion: ConversionRule::from_spec(&raw.conversion)?,
                aggregator: Aggregator::from_name(&raw.aggregator)?,
            };
            variable.validate()?;
            variables.push(variable);
        }

        if variables.is_empty() {
            return Err(ProcessingError::InvalidCatalog(format!(
                "No variables found in {}",
                path.display()
            )));
        }

        Ok(variables)
    }
}

impl Default for CatalogReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_catalog(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_catalog() {
        let file = write_catalog(
            "name,field_id,database_name,database_id,conversion,aggregator\n\
             temperature,T2M,M2T1NXSLV,tavg1_2d_slv_Nx,offset(-273.15),mean\n\
             precipitation,PRECTOT,M2T1NXFLX,tavg1_2d_flx_Nx,scale(3600),sum\n",
        );

        let variables = CatalogReader::new().read_catalog(file.path()).unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].name, "temperature");
        assert_eq!(variables[0].conversion, ConversionRule::Offset(-273.15));
        assert_eq!(variables[1].aggregator, Aggregator::Sum);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let file = write_catalog(
            "name,field_id,database_name,database_id,conversion,aggregator\n\
             temperature,T2M,M2T1NXSLV,tavg1_2d_slv_Nx,identity,mean\n\
             temperature,T10M,M2T1NXSLV,tavg1_2d_slv_Nx,identity,mean\n",
        );

        assert!(CatalogReader::new().read_catalog(file.path()).is_err());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let file =
            write_catalog("name,field_id,database_name,database_id,conversion,aggregator\n");
        assert!(CatalogReader::new().read_catalog(file.path()).is_err());
    }

    #[test]
    fn test_bad_aggregator_rejected() {
        let file = write_catalog(
            "name,field_id,database_name,database_id,conversion,aggregator\n\
             temperature,T2M,M2T1NXSLV,tavg1_2d_slv_Nx,identity,median\n",
        );
        assert!(CatalogReader::new().read_catalog(file.path()).is_err());
    }
}
