pub mod client;
pub mod config;
pub mod scheduler;
pub mod validator;

pub use client::{ArchiveClient, FetchError, FetchResult, GridFetcher};
pub use config::ArchiveConfig;
pub use scheduler::{enumerate_units, DownloadReport, DownloadScheduler};
pub use validator::{FileValidator, Verdict};
