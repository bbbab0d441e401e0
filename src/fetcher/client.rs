use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::Datelike;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetcher::config::ArchiveConfig;
use crate::models::fetch_unit::{stream_number, FetchUnit};
use crate::utils::constants::HOURS_PER_DAY;

/// Failure taxonomy at the fetch seam. Transient failures are retried by
/// the scheduler; permanent ones abandon the unit without aborting the
/// run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("transient: {0}")]
    Transient(String),

    #[error("permanent: {0}")]
    Permanent(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// One network fetch of a subset file. Implemented by the real archive
/// client and by mock fetchers in tests.
pub trait GridFetcher: Send + Sync {
    /// Fetch the unit's grid file into `dest`. On success `dest` exists
    /// and holds the complete response body.
    fn fetch(&self, unit: &FetchUnit, dest: &Path) -> impl Future<Output = FetchResult<()>> + Send;
}

/// HTTP client for the MERRA-2 OPeNDAP archive.
pub struct ArchiveClient {
    config: ArchiveConfig,
    client: reqwest::Client,
}

impl ArchiveClient {
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Subset request URL for one unit, in the archive's query form:
    /// `{field}[0:1:23][lat_min:1:lat_max][lon_min:1:lon_max]`.
    fn subset_url(&self, unit: &FetchUnit) -> FetchResult<String> {
        let stream = stream_number(unit.year())
            .map_err(|e| FetchError::Permanent(e.to_string()))?;
        let bounds = unit.bounds;

        Ok(format!(
            "{base}/{db_name}.5.12.4/{year}/{month:02}/MERRA2_{stream}.{db_id}.{ymd}.nc4.json?\
             {field}[0:1:{last_hour}][{lat_min}:1:{lat_max}][{lon_min}:1:{lon_max}]",
            base = self.config.base_url.trim_end_matches('/'),
            db_name = unit.variable.database_name,
            year = unit.year(),
            month = unit.date.month(),
            stream = stream,
            db_id = unit.variable.database_id,
            ymd = unit.date.format("%Y%m%d"),
            field = unit.variable.field_id,
            last_hour = HOURS_PER_DAY - 1,
            lat_min = bounds.lat_min,
            lat_max = bounds.lat_max,
            lon_min = bounds.lon_min,
            lon_max = bounds.lon_max,
        ))
    }

    fn classify_status(status: StatusCode) -> FetchError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                FetchError::Permanent(format!("authentication rejected ({})", status))
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                FetchError::Permanent(format!("malformed or unknown request ({})", status))
            }
            s if s.is_server_error()
                || s == StatusCode::REQUEST_TIMEOUT
                || s == StatusCode::TOO_MANY_REQUESTS =>
            {
                FetchError::Transient(format!("archive-side error ({})", s))
            }
            s => FetchError::Permanent(format!("unexpected status ({})", s)),
        }
    }

    async fn fetch_inner(&self, unit: &FetchUnit, dest: &Path) -> FetchResult<()> {
        let url = self.subset_url(unit)?;
        debug!(unit = %unit.label(), %url, "requesting subset");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| {
                // Timeouts and connection resets are worth another try.
                FetchError::Transient(format!("network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::classify_status(status);
            warn!(unit = %unit.label(), %status, "fetch failed");
            return Err(err);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transient(format!("body read error: {}", e)))?;

        // Write to a temp file in the destination directory, then rename,
        // so an interrupted download never leaves a partial file under the
        // unit's final name.
        let dir = dest.parent().ok_or_else(|| {
            FetchError::Permanent(format!("destination {} has no parent", dest.display()))
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| FetchError::Transient(format!("temp file error: {}", e)))?;
        tmp.write_all(&body)
            .map_err(|e| FetchError::Transient(format!("write error: {}", e)))?;
        tmp.persist(dest)
            .map_err(|e| FetchError::Transient(format!("rename error: {}", e)))?;

        debug!(unit = %unit.label(), bytes = body.len(), "subset written");
        Ok(())
    }
}

impl GridFetcher for ArchiveClient {
    fn fetch(&self, unit: &FetchUnit, dest: &Path) -> impl Future<Output = FetchResult<()>> + Send {
        self.fetch_inner(unit, dest)
    }
}
