//! Slack DM Exporter CLI - main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use slack_dm_export::{commands, Config, Error};

#[derive(Parser)]
#[command(name = "slack_dm_export")]
#[command(about = "Fetch a Slack DM conversation and export it to a spreadsheet", long_about = None)]
#[command(version)]
struct Cli {
    /// Name of user to fetch DMs with (exact, case-sensitive)
    #[arg(long)]
    user: String,

    /// Messages requested per history page (1-1000)
    #[arg(long, env = "SLACK_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Directory to write <user>-message-history.csv into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    if let Err(err) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", err);
    }

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_failure(&err)),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("slack_dm_export=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn execute(cli: Cli) -> Result<(), Error> {
    let mut config = match cli.config {
        Some(path) => Config::load_from_file(&path).map_err(Error::InvalidArgument)?,
        None => Config::new(),
    };
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    commands::export::run(&config, &cli.user).await?;
    Ok(())
}

/// Print the failure once and return the process exit code.
fn report_failure(err: &Error) -> u8 {
    debug!(kind = ?err.kind(), "export failed");
    eprintln!("Error: {}", err);
    err.kind().exit_code()
}
