//! Command-line entry point.

use clap::Parser;
use replay_dl::{Config, Context, FfmpegTranscoder};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Download whitelisted catch-up TV episodes
#[derive(Debug, Parser)]
#[command(name = "replay-dl", version)]
#[command(about = "Download whitelisted catch-up TV episodes", long_about = None)]
struct Cli {
    /// Where the files are going to be stored
    #[arg(long, value_name = "DIR")]
    dest: PathBuf,

    /// Path to the config file
    #[arg(long, default_value = "config.json", value_name = "FILE")]
    config: PathBuf,

    /// Number of parallel downloads (overrides the config file)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Catalog URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> replay_dl::Result<Config> {
    let mut config = Config::load(&cli.config)?;
    config.download.dest_dir = cli.dest.clone();
    if let Some(workers) = cli.workers {
        config.download.workers = workers;
    }
    if let Some(url) = &cli.catalog_url {
        config.catalog.catalog_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> replay_dl::Result<()> {
    let config = load_config(&cli)?;
    tracing::info!(
        dest = %config.dest_dir().display(),
        whitelist = config.whitelist.len(),
        workers = config.download.workers,
        "configuration loaded"
    );

    let transcoder = FfmpegTranscoder::discover(&config.tools)?;
    tracing::debug!(path = %transcoder.binary_path().display(), "ffmpeg found");

    let ctx = Context::new(config, Arc::new(transcoder))?;
    replay_dl::run(ctx).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "replay-dl failed");
            eprintln!("replay-dl error: {}", e);
            ExitCode::FAILURE
        }
    }
}
