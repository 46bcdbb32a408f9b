//! Sigbridge - HTTP bridge around a signature verification tool.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sigbridge::config::BridgeConfig;
use sigbridge::logs::ACTIVE_LOG_NAME;
use sigbridge::service::BridgeServer;

#[derive(Parser)]
#[command(
    name = "sigbridge",
    about = "HTTP bridge around a signature verification tool",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (defaults to .sigbridge.toml search).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the verification bridge server.
    Serve {
        /// Override the configured bind host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(verbosity: u8, log_file: Option<PathBuf>) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(fmt::layer()).with(filter);

    let file = log_file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .inspect_err(|e| eprintln!("Could not open log file {}: {e}", path.display()))
            .ok()
    });
    match file {
        Some(file) => registry
            .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
            .init(),
        None => registry.init(),
    }
}

fn load_config(cli: &Cli) -> Result<BridgeConfig, sigbridge::config::ConfigError> {
    sigbridge::config::load(cli.config.as_deref())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let log_file = config.logs_dir.as_ref().map(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Could not create logs directory {}: {e}", dir.display());
        }
        dir.join(ACTIVE_LOG_NAME)
    });
    init_tracing(cli.verbose, log_file);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let server = match BridgeServer::new(config) {
                Ok(server) => server,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid configuration");
                    std::process::exit(1);
                }
            };

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
            });

            if let Err(e) = server.with_cancellation(cancel).run().await {
                tracing::error!(error = %e, "Server error");
                std::process::exit(1);
            }
        }
    }
}
