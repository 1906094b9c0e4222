//! # Terminal Session Registry Console
//!
//! Operator console for the terminal session registry.
//!
//! ## Overview
//!
//! Reads commands from stdin and applies them to an in-memory registry:
//! - Session management (create, reconnect, remove, terminate all)
//! - Metadata updates (retitle, subprocess and working-directory reports)
//! - Listing (plain text or JSON)
//!
//! Logs go to stderr; stdout carries command replies only.
//!
//! ## Architecture
//!
//! This is Layer 2 - the binary that ties together:
//! - term-registry-core: Core types and configuration
//! - term-registry-session: Registry, busy aggregation, event ingestion

use std::sync::Arc;

use anyhow::Context;
use term_registry::{Console, LocalSessionFactory};
use term_registry_core::RegistryConfig;
use term_registry_session::{EventIngestion, SessionRegistry};
use tokio::io::BufReader;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing_subscriber::EnvFilter;

/// Capacity of the notification channel feeding event ingestion.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .or_else(|| std::env::var("TERM_REGISTRY_CONFIG").ok());

    let config = match &config_path {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => RegistryConfig::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "Terminal session registry v{} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.as_deref().unwrap_or("built-in defaults")
    );

    let factory = Arc::new(LocalSessionFactory::new());
    let registry = SessionRegistry::with_settings(
        factory.clone(),
        Arc::new(config.preferences.clone()),
        config.terminal.clone(),
    );

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let ingestion = EventIngestion::spawn(registry.clone(), events_rx);

    let mut busy_rx = registry.subscribe_busy();
    let busy_watch = tokio::spawn(async move {
        let mut last = None;
        loop {
            match busy_rx.recv().await {
                Ok(changed) => {
                    if last != Some(changed.busy) {
                        tracing::info!("Sessions busy: {}", changed.busy);
                        last = Some(changed.busy);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Busy watcher missed {} publication(s)", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let console = Console::new(registry.clone(), events_tx);
    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    ingestion.shutdown().await;
    busy_watch.abort();

    tracing::info!(
        "Shutting down with {} tracked session(s), {} live",
        registry.count(),
        factory.live_count()
    );

    Ok(())
}
