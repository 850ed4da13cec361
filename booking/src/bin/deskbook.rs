//! Deskbook console
//!
//! Runs the booking service against the configured database and reads
//! slash commands from standard input, one per line, printing each reply.
//!
//! This binary:
//! - Loads `.env` and the environment configuration
//! - Opens and migrates the `SQLite` reservation database
//! - Installs the Prometheus exporter when `METRICS_ADDR` is set
//! - Serves commands until end of input or Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! DESKBOOK_ACTOR_ID=210993 DESKBOOK_ACTOR_NAME=Ivan cargo run --bin deskbook
//! /book 25.12.25 A1 @ivan
//! /free
//! ```

use anyhow::Context;
use deskbook::{AdminList, BookingEngine, Config, Gateway};
use deskbook_core::{SystemClock, UuidIdentityGenerator};
use deskbook_sqlite::SqliteReservationStore;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,deskbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Deskbook...");

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        database = %config.database.url,
        seats = config.booking.seats.len(),
        admins = config.booking.admin_ids.len(),
        seat_policy = ?config.booking.seat_policy,
        contact_policy = ?config.booking.contact_handle_policy,
        "Configuration loaded"
    );

    if let Some(addr) = &config.server.metrics_addr {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("METRICS_ADDR is not a socket address: {addr}"))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }
    deskbook::metrics::register_business_metrics();

    let store = SqliteReservationStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open reservation database")?;
    store.migrate().await.context("Failed to migrate reservation database")?;
    tracing::info!(bookings = store.count().await?, "Reservation database ready");

    let engine = Arc::new(BookingEngine::new(
        store.clone(),
        SystemClock,
        UuidIdentityGenerator,
        config.seat_catalog(),
        config.booking_policy(),
    ));
    let gateway = Gateway::new(
        engine,
        AdminList::new(config.booking.admin_ids.clone()),
        config.booking.intro_image_path.clone(),
    );

    let actor = config.server.console_actor.actor();
    tracing::info!(actor = %actor.identity, "Reading commands from stdin (Ctrl+D or Ctrl+C to stop)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = gateway.handle_line(&actor, &line).await;
                println!("{}", reply.text);
                if let Some(image) = reply.image {
                    println!("[attached: {}]", image.display());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    tracing::info!("Shutting down gracefully...");
    store.close().await;
    Ok(())
}
