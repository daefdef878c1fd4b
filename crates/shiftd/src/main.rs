//! shiftd: the ControlShift daemon.
//!
//! Single binary that assembles the shift-handover dashboard:
//! - Shift store (redb), or offline mode when none is configured
//! - Live shift board with debounced controller writes
//! - Summarizer client
//! - Web UI + server-sent events
//!
//! # Usage
//!
//! ```text
//! shiftd init --data-dir /var/lib/controlshift
//! shiftd serve --config controlshift.toml --port 8080
//! shiftd summary --format chat
//! shiftd shift-id
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use shift_core::{ShiftConfig, ShiftContext, SummaryFormat, SystemClock};
use shift_dashboard::{DashboardState, ShiftBoard, dashboard_router, summarizer};
use shift_state::StateStore;

const DEFAULT_CONFIG_FILE: &str = "controlshift.toml";

#[derive(Parser)]
#[command(name = "shiftd", about = "ControlShift shift-handover dashboard")]
struct Cli {
    /// Config file (defaults to ./controlshift.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the handover summary of the current shift.
    Summary {
        /// `plain` for the clipboard, `chat` for the share link.
        #[arg(long, default_value = "plain")]
        format: SummaryFormat,
    },
    /// Print the partition key of the current shift.
    ShiftId,
    /// Write a starter config that stores data under `data_dir`.
    Init {
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,

        /// Where to write the config.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,shiftd=debug,shift=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let config = load_config(cli.config.as_deref())?;
            run_server(config, port).await
        }
        Command::Summary { format } => {
            let config = load_config(cli.config.as_deref())?;
            print_summary(&config, format)
        }
        Command::ShiftId => {
            let config = load_config(cli.config.as_deref())?;
            let context = ShiftContext::capture(&SystemClock, &config.schedule);
            println!("{}", context.key);
            Ok(())
        }
        Command::Init { data_dir, output } => init_config(&data_dir, &output),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ShiftConfig> {
    match path {
        Some(path) => {
            info!(path = ?path, "loading config");
            ShiftConfig::from_file(path)
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!(path = DEFAULT_CONFIG_FILE, "loading config");
            ShiftConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
        }
        None => {
            info!("no config file, using defaults");
            Ok(ShiftConfig::default())
        }
    }
}

fn open_store(config: &ShiftConfig) -> anyhow::Result<StateStore> {
    match &config.store.path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let store = StateStore::open(path)?;
            info!(path = ?path, "shift store opened");
            Ok(store)
        }
        None => {
            warn!("no store path configured, running offline");
            Ok(StateStore::offline())
        }
    }
}

fn build_board(config: &ShiftConfig, store: StateStore) -> ShiftBoard {
    ShiftBoard::new(
        store,
        Arc::new(SystemClock),
        config.schedule.clone(),
        Duration::from_millis(config.controllers.debounce_ms),
    )
}

async fn run_server(config: ShiftConfig, port: Option<u16>) -> anyhow::Result<()> {
    info!("ControlShift daemon starting");

    let store = open_store(&config)?;
    let board = Arc::new(build_board(&config, store));
    let summarizer: Arc<dyn shift_dashboard::Summarizer> =
        Arc::from(summarizer::from_config(&config.summarizer)?);
    if config.summarizer.endpoint.is_none() {
        info!("no summarizer endpoint configured, AI summary disabled");
    }

    let router = dashboard_router(DashboardState {
        board: Arc::clone(&board),
        summarizer,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server.port)));

    info!(%addr, "dashboard starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C. The board goes down first so open
    // event streams end and the server can drain.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for CTRL+C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            board.shutdown();
        })
        .await?;

    info!("ControlShift daemon stopped");
    Ok(())
}

fn print_summary(config: &ShiftConfig, format: SummaryFormat) -> anyhow::Result<()> {
    let board = build_board(config, open_store(config)?);
    let snapshot = board.snapshot();
    board.shutdown();
    if let Some(banner) = &snapshot.index_banner {
        warn!(message = banner.message(), "fault list unavailable");
    }
    println!("{}", snapshot.summary(format));
    Ok(())
}

fn init_config(data_dir: &Path, output: &Path) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let config = ShiftConfig::scaffold(data_dir);
    std::fs::write(output, config.to_toml_string()?)?;
    info!(path = ?output, "config written");
    Ok(())
}
