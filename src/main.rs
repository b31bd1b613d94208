//! Multi-listener HTTP server supervisor (v1)
//!
//! Launches one HTTP(S) listener per configured address and runs them as a
//! single unit: a signal stops all of them, and so does the first listener
//! that fails.
//!
//! # Architecture Overview
//!
//! ```text
//!   supervisor.toml
//!        │
//!        ▼
//!   ┌─────────┐   per [[servers]] entry   ┌──────────────────────────────┐
//!   │ config  │──────────────────────────▶│ launcher                     │
//!   └─────────┘                           │  authenticator + TLS config  │
//!                                         │  base router + auth layer    │
//!                                         └──────────────┬───────────────┘
//!                                                        │ per address
//!                                                        ▼
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │ SupervisionGroup                                                 │
//!   │   ┌────────────┐ ┌────────────┐       ┌────────────┐             │
//!   │   │ serve task │ │ close task │  ...  │ serve task │ ...         │
//!   │   └─────┬──────┘ └─────┬──────┘       └────────────┘             │
//!   │         └──ListenerUnit┘                                         │
//!   │   cancellation token ◀── SIGINT/SIGTERM or first fatal error     │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_supervisor::auth::DefaultAuthenticatorFactory;
use http_supervisor::config::load_config;
use http_supervisor::http::base_router;
use http_supervisor::lifecycle::{launch, shutdown_signal, SupervisionGroup};
use http_supervisor::observability::init_logging;

#[derive(Parser)]
#[command(name = "http-supervisor")]
#[command(about = "Run a fleet of authenticated HTTP listeners as one unit", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "supervisor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability)?;

    tracing::info!(
        config = %cli.config.display(),
        servers = config.servers.len(),
        "http-supervisor v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let group = SupervisionGroup::new();

    match launch(&config.servers, base_router(), &group, &DefaultAuthenticatorFactory).await {
        Ok(handles) => tracing::info!(listeners = handles.len(), "All listeners launched"),
        // Listeners from earlier configurations are already running; stop them too.
        Err(e) => group.report_error(e),
    }

    tokio::select! {
        _ = shutdown_signal() => group.cancel(),
        _ = group.cancelled() => {}
    }

    group.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
