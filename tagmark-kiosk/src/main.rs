//! Tagmark kiosk - main entry point
//!
//! Reads RFID tag codes from the serial-attached reader, records
//! time-in / time-out attendance events in the local database, renders the
//! live log and notifies users by email.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagmark_common::config;
use tagmark_common::db;
use tagmark_kiosk::display;
use tagmark_kiosk::ingest::IngestLoop;
use tagmark_kiosk::notifier::EmailNotifier;
use tagmark_kiosk::reader;

/// Command-line arguments for tagmark-kiosk
#[derive(Parser, Debug)]
#[command(name = "tagmark-kiosk")]
#[command(about = "RFID attendance kiosk")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "TAGMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the attendance database
    #[arg(short, long, env = "TAGMARK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Serial port of the RFID reader (overrides config and discovery)
    #[arg(short = 'p', long)]
    serial_port: Option<String>,

    /// Baud rate of the RFID reader
    #[arg(short, long)]
    baud: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.serial_port {
        cfg.serial.port = Some(port);
    }
    if let Some(baud) = args.baud {
        cfg.serial.baud_rate = baud;
    }

    // Initialize tracing; RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tagmark kiosk v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &cfg);
    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let notifier = match cfg.email.clone() {
        Some(email) => Some(Arc::new(
            EmailNotifier::new(email).context("Failed to create email notifier")?,
        )),
        None => {
            warn!("No [email] configuration; notifications disabled");
            None
        }
    };

    let (display_bus, _display_task) = display::spawn();

    // Show the existing log before the first scan arrives
    let records = db::list_records(&pool)
        .await
        .context("Failed to read attendance log")?;
    display_bus.render(records);

    let (scan_tx, scan_rx) = tokio::sync::mpsc::channel(16);
    let (ack_tx, ack_rx) = std::sync::mpsc::channel();
    let shutdown = Arc::new(AtomicBool::new(false));

    let reader_thread = reader::spawn(cfg.serial.clone(), scan_tx, ack_rx, shutdown.clone())
        .context("Failed to spawn reader thread")?;

    let ingest = IngestLoop::new(
        pool.clone(),
        display_bus.clone(),
        notifier,
        ack_tx,
        std::time::Duration::from_secs(cfg.serial.duplicate_scan_window_secs),
    );
    let ingest_task = tokio::spawn(ingest.run(scan_rx));

    shutdown_signal().await;
    info!("Shutting down");

    // Stop the reader first; dropping the port closes the serial connection
    shutdown.store(true, Ordering::Relaxed);
    if reader_thread.join().is_err() {
        warn!("Reader thread panicked during shutdown");
    }
    let _ = ingest_task.await;
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
