use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use libtable::TableEngine;
use rime_bridge_core::config::default_user_data_dir;
use rime_bridge_core::{run, BridgeConfig, EngineHandle, Shutdown, StdinSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Read key events as JSON lines on stdin and answer each with the
/// resulting commit, composition and menu on stdout.
#[derive(Parser, Debug)]
#[command(name = "rime-cli", version)]
struct Args {
    /// Directory with the shared `.table` files
    #[arg(long, value_name = "DIR")]
    shared_data_dir: Option<PathBuf>,

    /// Per-user data directory (default: $XDG_DATA_HOME/rime-cli)
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Bridge settings (default: rime-cli.toml in the user data directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    // stdout carries the protocol
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_toml(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let user_dir = match &args.user_data_dir {
                Some(dir) => dir.clone(),
                None => default_user_data_dir()?,
            };
            BridgeConfig::load_from_dir(&user_dir)?
        }
    };

    if let Some(dir) = &args.shared_data_dir {
        config.shared_data_dir = dir.clone();
    }
    if let Some(dir) = &args.user_data_dir {
        config.user_data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn serve(args: &Args) -> Result<()> {
    let shutdown = Shutdown::new();
    shutdown
        .install()
        .context("failed to install signal handlers")?;

    let config = load_config(args)?;
    let traits = config.traits()?;
    info!(
        shared = %traits.shared_data_dir.display(),
        user = %traits.user_data_dir.display(),
        "starting rime-cli"
    );

    let engine = EngineHandle::connect(TableEngine::new(), traits)?;
    let mut source = StdinSource::spawn(config.max_line_bytes, config.poll_interval());
    let mut stdout = io::stdout().lock();
    let reason = run(engine, shutdown, &mut source, &mut stdout)?;
    info!(?reason, "rime-cli stopped");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match serve(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rime-cli: {e:#}");
            ExitCode::FAILURE
        }
    }
}
