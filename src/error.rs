use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Grid file parsing error: {0}")]
    GridParse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidCatalog(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Duplicate timestamp {timestamp} in series for {series}")]
    DuplicateTimestamp { series: String, timestamp: String },

    #[error("Year {0} is outside the MERRA-2 record (1980 onwards)")]
    YearOutOfRange(i32),

    #[error("Download cancelled by user")]
    Cancelled,
}
