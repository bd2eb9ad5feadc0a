//! publication-status — report the publishing pipeline's latest state.
//!
//! Looks up the current sequence number and the matching publishing
//! process in the search service, then prints the overall status.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
