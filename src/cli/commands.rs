use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::fetcher::{enumerate_units, ArchiveClient, ArchiveConfig, DownloadScheduler};
use crate::models::{GridBounds, Location, VariableSpec};
use crate::processors::{ProcessingPool, RunSummary};
use crate::readers::{CatalogReader, LocationReader};
use crate::utils::constants::RAW_DIR;
use crate::utils::coordinates::{grid_index_to_lat, grid_index_to_lon};
use crate::utils::progress::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Run {
            catalog,
            locations,
            data_dir,
            output_dir,
            start_year,
            end_year,
            connections,
            workers,
            max_retries,
            base_url,
            config_file,
        } => {
            let (variables, locations) = load_inputs(&catalog, &locations)?;
            let output_dir = output_dir.unwrap_or_else(|| data_dir.join("processed"));

            let report = download(
                &variables,
                &locations,
                &data_dir,
                start_year,
                end_year,
                connections,
                max_retries,
                base_url,
                config_file.as_deref(),
            )
            .await?;
            println!("\n{}", report.generate_summary());

            let summaries = process(&variables, &locations, &data_dir, &output_dir, workers)?;
            let summary = RunSummary::new(summaries, RunSummary::failures_from_report(&report));
            println!("\n{}", summary.generate_summary());

            if !summary.all_pairs_have_data() {
                warn!("some (variable, location) pairs produced no data");
            }
            println!("Processing complete!");
        }

        Commands::Download {
            catalog,
            locations,
            data_dir,
            start_year,
            end_year,
            connections,
            max_retries,
            base_url,
            config_file,
        } => {
            let (variables, locations) = load_inputs(&catalog, &locations)?;

            let report = download(
                &variables,
                &locations,
                &data_dir,
                start_year,
                end_year,
                connections,
                max_retries,
                base_url,
                config_file.as_deref(),
            )
            .await?;
            println!("\n{}", report.generate_summary());
        }

        Commands::Process {
            catalog,
            locations,
            data_dir,
            output_dir,
            workers,
        } => {
            let (variables, locations) = load_inputs(&catalog, &locations)?;
            let output_dir = output_dir.unwrap_or_else(|| data_dir.join("processed"));

            let summaries = process(&variables, &locations, &data_dir, &output_dir, workers)?;
            let summary = RunSummary::new(summaries, Vec::new());
            println!("\n{}", summary.generate_summary());
        }
    }

    Ok(())
}

fn load_inputs(catalog: &Path, locations: &Path) -> Result<(Vec<VariableSpec>, Vec<Location>)> {
    let variables = CatalogReader::new().read_catalog(catalog)?;
    let locations = LocationReader::new().read_locations(locations)?;

    println!(
        "Loaded {} variables and {} locations",
        variables.len(),
        locations.len()
    );

    Ok((variables, locations))
}

#[allow(clippy::too_many_arguments)]
async fn download(
    variables: &[VariableSpec],
    locations: &[Location],
    data_dir: &Path,
    start_year: i32,
    end_year: i32,
    connections: usize,
    max_retries: u32,
    base_url: Option<String>,
    config_file: Option<&Path>,
) -> Result<crate::fetcher::DownloadReport> {
    let bounds = GridBounds::covering(locations)?;
    let units = enumerate_units(variables, bounds, start_year, end_year)?;

    println!(
        "Downloading {} units ({} variables x years {}-{})",
        units.len(),
        variables.len(),
        start_year,
        end_year
    );
    println!(
        "Grid window: {:.2}..{:.2} lat, {:.2}..{:.2} lon",
        grid_index_to_lat(bounds.lat_min),
        grid_index_to_lat(bounds.lat_max),
        grid_index_to_lon(bounds.lon_min),
        grid_index_to_lon(bounds.lon_max),
    );

    let mut settings = ArchiveConfig::load(config_file)?;
    if let Some(base_url) = base_url {
        settings.base_url = base_url;
    }
    let client = ArchiveClient::new(settings)?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, stopping downloads...");
            ctrl_c_token.cancel();
        }
    });

    let scheduler = DownloadScheduler::new(client, connections)
        .with_max_retries(max_retries)
        .with_cancellation(cancel);

    let raw_dir = data_dir.join(RAW_DIR);
    let progress = ProgressReporter::new(units.len() as u64, "Downloading grid subsets...", false);
    let report = scheduler.run(units, &raw_dir, Some(&progress)).await?;
    progress.finish_with_message("Downloads complete");

    Ok(report)
}

fn process(
    variables: &[VariableSpec],
    locations: &[Location],
    data_dir: &Path,
    output_dir: &Path,
    workers: usize,
) -> Result<Vec<crate::processors::PairSummary>> {
    let raw_dir = data_dir.join(RAW_DIR);
    let pair_count = (variables.len() * locations.len()) as u64;
    let progress = ProgressReporter::new(pair_count, "Aggregating series...", false);

    let pool = ProcessingPool::new(workers);
    let summaries = pool.process_all(variables, locations, &raw_dir, output_dir, Some(&progress))?;
    progress.finish_with_message("Aggregation complete");

    Ok(summaries)
}
