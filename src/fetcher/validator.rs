use std::path::Path;

use tracing::debug;

use crate::readers::GridReader;
use crate::utils::constants::HOURS_PER_DAY;

/// Verdict on a downloaded grid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Structural integrity checks for downloaded grid files.
///
/// Checks run in order: the file exists and is non-empty, parses as a
/// grid subset, declares the expected number of timesteps for its
/// sub-period, and carries the requested field with at least one real
/// observation. The validator never deletes; callers remove invalid
/// files before re-fetching.
pub struct FileValidator {
    expected_timesteps: usize,
}

impl FileValidator {
    pub fn new() -> Self {
        Self {
            expected_timesteps: HOURS_PER_DAY,
        }
    }

    pub fn with_expected_timesteps(expected_timesteps: usize) -> Self {
        Self { expected_timesteps }
    }

    pub fn validate(&self, path: &Path, field_id: &str) -> Verdict {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => return Verdict::Invalid(format!("file not readable: {}", e)),
        };
        if metadata.len() == 0 {
            return Verdict::Invalid("file is empty".to_string());
        }

        let subset = match GridReader::new().read(path) {
            Ok(s) => s,
            Err(e) => return Verdict::Invalid(format!("not a readable grid file: {}", e)),
        };

        if subset.time_hours.len() != self.expected_timesteps {
            return Verdict::Invalid(format!(
                "time axis has {} entries, expected {}",
                subset.time_hours.len(),
                self.expected_timesteps
            ));
        }

        if subset.field_id != field_id {
            return Verdict::Invalid(format!(
                "file carries field '{}', expected '{}'",
                subset.field_id, field_id
            ));
        }

        if !subset.has_any_observation() {
            return Verdict::Invalid(format!("field '{}' holds no observations", field_id));
        }

        debug!(path = %path.display(), "grid file validated");
        Verdict::Valid
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}
