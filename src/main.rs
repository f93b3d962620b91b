//! Seatwatch daemon and CLI.
//!
//! Run with: cargo run -- --config config.toml run
//!
//! Environment variables:
//! - RUST_LOG: Log filter (overrides app.log_level from the config file)
//! - Secret variables named by the config, e.g. SLACK_WEBHOOK_URL or
//!   SEATWATCH_SMTP_PASSWORD_FILE

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatwatch::config::{load_config, Config};
use seatwatch::notify::build_notifier;
use seatwatch::store::SeatStore;
use seatwatch::watcher::WatcherService;

#[derive(Parser)]
#[command(name = "seatwatch", version, about = "Seat availability watcher")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every configured monitor until interrupted
    Run,
    /// Create the database and apply migrations
    InitDb,
    /// Send a test notification without touching the database
    TestNotify {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        /// Comma-separated notifier names to use; default uses all in first monitor
        #[arg(long, default_value = "")]
        channels: String,
    },
    /// Show recent observations for a match, newest first
    History {
        match_id: String,
        /// Maximum rows to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // Initialize logging; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = SeatStore::connect(&config.database.url)?;

    match cli.command {
        Command::Run => run_watcher(config, store).await,
        Command::InitDb => init_db(store).await,
        Command::TestNotify {
            subject,
            body,
            channels,
        } => test_notify(&config, &subject, &body, &channels).await,
        Command::History { match_id, limit } => history(&store, &match_id, limit).await,
    }
}

async fn run_watcher(
    config: Config,
    store: SeatStore,
) -> Result<(), Box<dyn std::error::Error>> {
    store.migrate().await?;

    tracing::info!("Seatwatch configuration:");
    tracing::info!("  Timezone: {}", config.app.timezone);
    tracing::info!("  Database: {}", config.database.url);
    tracing::info!("  Monitors: {}", config.monitors.len());

    let service = WatcherService::build(&config, store)?;
    if service.is_empty() {
        tracing::warn!("No monitors configured; nothing to do");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    service.run(shutdown_rx).await;
    Ok(())
}

async fn init_db(store: SeatStore) -> Result<(), Box<dyn std::error::Error>> {
    store.migrate().await?;
    println!("Database initialized");
    Ok(())
}

async fn test_notify(
    config: &Config,
    subject: &str,
    body: &str,
    channels: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<String> = if channels.is_empty() {
        config
            .monitors
            .first()
            .map(|monitor| monitor.channels.clone())
            .unwrap_or_default()
    } else {
        channels
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    };
    if names.is_empty() {
        return Err("No channels to test; pass --channels or configure a monitor".into());
    }

    let notifier = build_notifier(&config.notifiers, &names)?;
    notifier.send_all(subject, Some(body)).await?;
    println!("Test notification sent");
    Ok(())
}

async fn history(
    store: &SeatStore,
    match_id: &str,
    limit: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    store.migrate().await?;

    let rows = store.recent_observations(match_id, limit).await?;
    if rows.is_empty() {
        println!("No observations for {}", match_id);
        return Ok(());
    }
    for row in rows {
        println!(
            "{}  {}  seats={}",
            row.created_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            row.match_id,
            row.seats_available
        );
    }
    Ok(())
}
