//! manifest-combine — merge `manifest.xml` fragments into a template.
//!
//! Collects every `layout`, `portlet` and `role` element found under a
//! directory and writes them, inside the template's containers, to
//! `manifest_temporary.xml`.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
