//! api-mocker: configuration-driven mock HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.json ──▶ config::loader ──▶ config::legacy ──▶ Options (merged)
//!                                                            │
//!                                                            ▼
//!                                                  routing::compiler
//!                                                  (one route per verb)
//!                                                            │
//!                                                            ▼
//!   Client ──▶ http::server ──▶ live router (ArcSwap) ──▶ http::response
//!              request id,                                latency, switch,
//!              trace, reload                              mock file, CORS
//! ```
//!
//! CLI flags act as constructor overrides; values in the config file win.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_mocker::config::watcher::ConfigWatcher;
use api_mocker::config::{OptionsOverrides, Port};
use api_mocker::lifecycle::{signals, Shutdown};
use api_mocker::observability::logging;
use api_mocker::{HttpServer, MockServer};

#[derive(Parser)]
#[command(name = "api-mocker")]
#[command(about = "Serve canned HTTP responses from a JSON service map", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overridden by the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Reload when the config file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let logs = logging::init(cli.quiet);

    tracing::info!("api-mocker v{} starting", env!("CARGO_PKG_VERSION"));

    let overrides = OptionsOverrides {
        port: cli.port.map(Port::Number),
        quiet: cli.quiet.then_some(true),
        ..Default::default()
    };
    let mut mocker = MockServer::new(overrides);
    if let Some(path) = &cli.config {
        mocker.set_config_file(path);
    }
    mocker.load_config_file()?;
    logs.set_quiet(mocker.options().is_quiet());

    let port = mocker.options().port.as_u16()?;
    tracing::info!(
        port,
        mock_directory = %mocker.options().mock_directory,
        config = ?mocker.config_file_path(),
        services = mocker.options().web_services.len(),
        "Configuration loaded"
    );

    let (_watcher, reloads) = match (cli.watch, mocker.config_file_path()) {
        (true, Some(path)) => {
            let (watcher, reloads) = ConfigWatcher::new(path);
            (Some(watcher.run()?), reloads)
        }
        (watch, _) => {
            if watch {
                tracing::warn!("--watch needs --config; file watching disabled");
            }
            let (_, reloads) = mpsc::unbounded_channel();
            (None, reloads)
        }
    };

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    HttpServer::new(mocker)
        .run(listener, reloads, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
