//! CLI definition, tracing setup, and the combine command.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use pubtools_manifest::{CombineOptions, MalformedPolicy, combine};
use pubtools_shared::load_config_or_default;
use tracing::debug;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Merge manifest.xml fragments into a template document.
#[derive(Parser)]
#[command(
    name = "manifest-combine",
    version,
    about = "Merge layout/portlet/role elements from every manifest.xml under a directory into a template.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Template document containing <root> with <layouts>, <portlets> and <roles>.
    pub template: PathBuf,

    /// Directory scanned recursively for manifest.xml files.
    pub directory: PathBuf,

    /// Output path (defaults to <DIRECTORY>/manifest_temporary.xml).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip malformed fragments with a warning instead of aborting.
    #[arg(long)]
    pub skip_malformed: bool,

    /// Config file (defaults to ~/.pubtools/pubtools.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = format!(
        "warn,manifest_combine={level},pubtools_manifest={level},pubtools_shared={level}"
    );

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Run the merge and print a summary.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = load_config_or_default(cli.config.as_deref())?;
    debug!(manifest = ?config.manifest, "resolved manifest config");

    let mut opts = CombineOptions::from_config(cli.template, cli.directory, &config.manifest);
    opts.output = cli.output;
    if cli.skip_malformed {
        opts.on_malformed = MalformedPolicy::Skip;
    }

    let report = combine(&opts)?;

    println!("Merged {} manifest file(s) into {}", report.fragments, report.output.display());
    println!(
        "  layouts: {}  portlets: {}  roles: {}",
        report.layouts, report.portlets, report.roles
    );
    for path in &report.skipped {
        println!("  skipped (malformed): {}", path.display());
    }

    Ok(())
}
