use std::path::Path;

use serde::Deserialize;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Remote archive settings: endpoint, credentials and request timeout.
///
/// Constructed once and passed into the scheduler; nothing here is
/// process-global. Values come from an optional TOML file overlaid with
/// `MERRA2_*` environment variables (`MERRA2_USERNAME`,
/// `MERRA2_PASSWORD`, `MERRA2_BASE_URL`, `MERRA2_TIMEOUT_SECS`).
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl ArchiveConfig {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("username", "")?
            .set_default("password", "")?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("MERRA2"));

        let settings: ArchiveConfig = builder.build()?.try_deserialize()?;

        if settings.username.is_empty() || settings.password.is_empty() {
            return Err(ProcessingError::Config(
                "Archive credentials missing: set MERRA2_USERNAME and MERRA2_PASSWORD \
                 or provide them in a config file"
                    .to_string(),
            ));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "username = \"alice\"\npassword = \"secret\"\ntimeout_secs = 30"
        )
        .unwrap();

        let settings = ArchiveConfig::load(Some(file.path())).unwrap();
        assert_eq!(settings.username, "alice");
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "username = \"alice\"").unwrap();

        assert!(ArchiveConfig::load(Some(file.path())).is_err());
    }
}
