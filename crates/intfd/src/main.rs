//! intfd daemon entry point.
//!
//! Parses the command line, loads the configuration, initializes logging and
//! runs the reconciliation loop (or a one-shot dump) against the store.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use sonic_intfd::{IntfMgr, IntfdConfig, LogFormat, PassOutcome};
use sonic_intfd_store::MemoryStore;

/// SONiC interface reconciliation daemon
#[derive(Parser, Debug)]
#[command(name = "intfd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = sonic_intfd::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level, overrides the configuration file (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reconciliation loop until interrupted
    Run,
    /// Reconcile the store snapshot once and print the interface state
    Dump {
        /// Only dump this interface
        #[arg(short = 'i', long)]
        interface: Option<String>,
    },
}

/// Initialize tracing/logging.
///
/// RUST_LOG takes precedence over `level`.
fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false).pretty())
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false).compact())
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init(),
    }
}

fn open_store(config: &IntfdConfig) -> anyhow::Result<MemoryStore> {
    match &config.store.snapshot {
        Some(path) => MemoryStore::load_snapshot(path)
            .with_context(|| format!("loading store snapshot {}", path.display())),
        None => {
            warn!("No store snapshot configured, starting with an empty store");
            Ok(MemoryStore::new())
        }
    }
}

async fn run(config: IntfdConfig) -> anyhow::Result<()> {
    let mut store = open_store(&config)?;
    let mut mgr = IntfMgr::new(config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };
    mgr.run(&mut store, shutdown)
        .await
        .context("reconciliation loop failed")
}

async fn dump(config: IntfdConfig, interface: Option<String>) -> anyhow::Result<()> {
    let mut store = open_store(&config)?;
    let mut mgr = IntfMgr::new(config);

    let outcome = mgr
        .run_once(&mut store)
        .await
        .context("reconciling store snapshot")?;
    if outcome == PassOutcome::SystemNotReady {
        warn!("System cur_cfg is not set, nothing was reconciled");
    }
    print!("{}", mgr.debug_dump(interface.as_deref()));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match IntfdConfig::load(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("intfd: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, config.logging.format);
    if !config_found {
        warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("--- Starting intfd ---");
            run(config).await
        }
        Command::Dump { interface } => dump(config, interface).await,
    };

    match result {
        Ok(()) => {
            info!("intfd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("intfd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
