/// MERRA-2 OPeNDAP archive root.
pub const DEFAULT_BASE_URL: &str = "https://goldsmr4.gesdisc.eosdis.nasa.gov/opendap/MERRA2";

/// GEOS-5 native grid geometry. Latitude indices run 0..=360 at 0.5
/// degree steps, longitude indices 0..=575 at 0.625 degree steps.
pub const GRID_LAT_POINTS: usize = 361;
pub const GRID_LON_POINTS: usize = 576;
pub const GRID_LAT_STEP: f64 = 0.5;
pub const GRID_LON_STEP: f64 = 0.625;

/// Hourly day files carry exactly this many timesteps.
pub const HOURS_PER_DAY: usize = 24;

/// MERRA-2 fill value for missing cells.
pub const MISSING_FILL_VALUE: f64 = 1.0e15;

/// Directory under the data dir holding raw grid subset files.
pub const RAW_DIR: &str = "raw";

/// Scheduling defaults.
pub const DEFAULT_CONNECTIONS: usize = 5;
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
