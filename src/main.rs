use clap::Parser;
use merra2_processor::cli::{run, Cli};
use merra2_processor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
