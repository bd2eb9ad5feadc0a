//! CLI definition, tracing setup, and the status command.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use pubtools_shared::{ConnectionConfig, load_config_or_default};
use pubtools_status::{SearchClient, fetch_status, render_report};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Report the latest state of the publishing pipeline.
#[derive(Parser)]
#[command(
    name = "publication-status",
    version,
    about = "Print the current publishing sequence number and its process state.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Search service base URL.
    #[arg(long, env = "ES_HOST")]
    pub host: Option<String>,

    /// Basic-auth user name.
    #[arg(long, env = "ES_USER")]
    pub user: Option<String>,

    /// Basic-auth password.
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Also print the status of each external task.
    #[arg(long)]
    pub tasks: bool,

    /// Report format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

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

/// Report output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout
/// carries only the report.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = format!(
        "warn,publication_status={level},pubtools_status={level},pubtools_shared={level}"
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

/// Query the service and print the report.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config_or_default(cli.config.as_deref())?;

    let conn = ConnectionConfig::resolve(
        &config.elasticsearch,
        cli.host,
        cli.user,
        cli.password,
        cli.timeout_secs,
    );
    info!(host = %conn.host, user = ?conn.user, "querying publication status");

    let client = SearchClient::new(&conn)?;
    let status = fetch_status(&client, &config.publication).await?;

    match cli.format {
        OutputFormat::Text => print!("{}", render_report(&status, cli.tasks)),
        OutputFormat::Json => {
            let mut status = status;
            if !cli.tasks {
                status.tasks.clear();
            }
            let json = serde_json::to_string_pretty(&status).wrap_err("failed to encode report")?;
            println!("{json}");
        }
    }

    Ok(())
}
