//! Front-end gateway.
//!
//! Serves a bundled web front-end: either by proxying to its development
//! server, or by streaming the built files from disk with the entry document
//! rewritten for the configured base path and memoized.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                  GATEWAY                      │
//!    Client Request   │  ┌─────────┐    ┌───────────┐                 │
//!    ─────────────────┼─▶│  http   │───▶│ frontend  │                 │
//!                     │  │ server  │    │ (mode set │                 │
//!                     │  └─────────┘    │ at start) │                 │
//!                     │                 └─────┬─────┘                 │
//!                     │            dev ┌──────┴──────┐ prod           │
//!                     │                ▼             ▼                │
//!                     │         ┌───────────┐  ┌──────────────┐       │
//!                     │         │   proxy   │  │ static files │       │
//!                     │         │ + rewrite │  │ + memo cache │       │
//!                     │         └─────┬─────┘  └──────┬───────┘       │
//!                     └───────────────┼───────────────┼───────────────┘
//!                                     ▼               ▼
//!                              dev server        root_dir on disk
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use frontend_gateway::config::{self, GatewayConfig};
use frontend_gateway::lifecycle::{self, Shutdown};
use frontend_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "frontend-gateway")]
#[command(about = "Serve a bundled web front-end, proxied in development or from disk in production", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force development (proxy) mode.
    #[arg(long)]
    dev: bool,

    /// Development server address (host:port).
    #[arg(long)]
    upstream: Option<String>,

    /// Directory holding the built front-end.
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Prefix inserted in front of root-relative asset URLs.
    #[arg(long)]
    base_path: Option<String>,

    /// Listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut GatewayConfig) {
        if self.dev {
            config.frontend.dev = true;
        }
        if let Some(upstream) = self.upstream {
            config.frontend.upstream = upstream;
        }
        if let Some(root_dir) = self.root_dir {
            config.frontend.root_dir = root_dir;
        }
        if let Some(base_path) = self.base_path {
            config.frontend.base_path = base_path;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
    }
}

fn load(mut cli: Cli) -> Result<GatewayConfig, config::ConfigError> {
    let path = cli.config.take();
    config::load_with_overrides(path.as_deref(), |config| cli.apply(config))
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("frontend-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        dev = config.frontend.dev,
        "frontend-gateway starting"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    match lifecycle::start(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
