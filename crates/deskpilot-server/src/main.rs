//! deskpilot entry point.
//!
//! Serves the desktop-automation command surface over MCP on stdin/stdout.
//! stdout carries the protocol, so all logging goes to stderr.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config (file → CLI overrides)
//!  └─ DriverSelector::native()    -- resolves the OS driver on first command
//!  └─ Dispatcher                   -- decode → Desktop call → ToolResponse
//!  └─ McpSession::run(stdin, stdout, shutdown_signal())
//!  └─ runtime.shutdown_timeout()  -- bounds any abandoned native call
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use deskpilot_core::protocol::registry;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deskpilot_server::application::automate::DriverTimings;
use deskpilot_server::application::dispatch::Dispatcher;
use deskpilot_server::application::select_driver::DriverSelector;
use deskpilot_server::infrastructure::session::McpSession;
use deskpilot_server::infrastructure::storage::config::{load_config, load_config_from};

/// How long an in-flight native call may delay process exit.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Command-line arguments for the deskpilot server.
#[derive(Debug, Parser)]
#[command(
    name = "deskpilot",
    version,
    about = "Desktop automation (screenshots, pointer, keyboard, windows) over MCP stdio"
)]
struct Cli {
    /// Path to a TOML config file.  Defaults to the platform config dir.
    #[arg(long, env = "DESKPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug`.  `RUST_LOG` takes precedence.
    #[arg(long, env = "DESKPILOT_LOG")]
    log_level: Option<String>,

    /// Delay between clicks of a multi-click, overriding the config file.
    #[arg(long)]
    click_interval_ms: Option<u64>,

    /// Delay between the pointer warp and the first press, overriding the config file.
    #[arg(long)]
    pointer_settle_ms: Option<u64>,

    /// Print the command registry as JSON and exit.
    #[arg(long)]
    list_commands: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_commands {
        println!("{}", serde_json::to_string_pretty(&registry::list_json())?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.server.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut timing = config.timing;
    if let Some(ms) = cli.click_interval_ms {
        timing.click_interval_ms = ms;
    }
    if let Some(ms) = cli.pointer_settle_ms {
        timing.pointer_settle_ms = ms;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let result = runtime.block_on(serve(timing.driver_timings()));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn serve(timings: DriverTimings) -> anyhow::Result<()> {
    let selector = DriverSelector::native(timings);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        os = %selector.family(),
        ?timings,
        "deskpilot starting"
    );

    let session = McpSession::new(Dispatcher::new(Arc::new(selector)));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let end = session
        .run(stdin, stdout, shutdown_signal())
        .await
        .context("session transport failed")?;
    info!(?end, "deskpilot stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("interrupt received"),
        () = terminate => info!("terminate signal received"),
    }
}
