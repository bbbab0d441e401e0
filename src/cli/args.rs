use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::{DEFAULT_CONNECTIONS, DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};

#[derive(Parser)]
#[command(name = "merra2-processor")]
#[command(about = "MERRA-2 subset downloader and hourly/daily/weekly aggregator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download raw grid subsets and produce the aggregated series
    Run {
        #[arg(long, help = "Variable catalog CSV")]
        catalog: PathBuf,

        #[arg(long, help = "Location list CSV")]
        locations: PathBuf,

        #[arg(long, default_value = "data", help = "Base data directory")]
        data_dir: PathBuf,

        #[arg(long, help = "Output directory [default: <data-dir>/processed]")]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        start_year: i32,

        #[arg(long)]
        end_year: i32,

        #[arg(long, default_value_t = DEFAULT_CONNECTIONS, help = "Max concurrent downloads")]
        connections: usize,

        #[arg(long, default_value_t = DEFAULT_WORKERS, help = "Processing worker count")]
        workers: usize,

        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        #[arg(long, help = "Override the archive base URL")]
        base_url: Option<String>,

        #[arg(long, help = "Archive settings TOML (credentials, base URL)")]
        config_file: Option<PathBuf>,
    },

    /// Download and validate raw grid subsets only
    Download {
        #[arg(long, help = "Variable catalog CSV")]
        catalog: PathBuf,

        #[arg(long, help = "Location list CSV")]
        locations: PathBuf,

        #[arg(long, default_value = "data", help = "Base data directory")]
        data_dir: PathBuf,

        #[arg(long)]
        start_year: i32,

        #[arg(long)]
        end_year: i32,

        #[arg(long, default_value_t = DEFAULT_CONNECTIONS, help = "Max concurrent downloads")]
        connections: usize,

        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        #[arg(long, help = "Override the archive base URL")]
        base_url: Option<String>,

        #[arg(long, help = "Archive settings TOML (credentials, base URL)")]
        config_file: Option<PathBuf>,
    },

    /// Aggregate already-downloaded raw grid subsets
    Process {
        #[arg(long, help = "Variable catalog CSV")]
        catalog: PathBuf,

        #[arg(long, help = "Location list CSV")]
        locations: PathBuf,

        #[arg(long, default_value = "data", help = "Base data directory")]
        data_dir: PathBuf,

        #[arg(long, help = "Output directory [default: <data-dir>/processed]")]
        output_dir: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_WORKERS, help = "Processing worker count")]
        workers: usize,
    },
}
