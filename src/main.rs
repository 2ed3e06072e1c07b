// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fogwalk API Server
//!
//! Serves the exploration engine: GPS fixes in, revealed trail, run history
//! and district unlocks out.

use fogwalk::{
    config::Config,
    db::JsonStore,
    services::{Notification, Notifier, OverpassClient, Session},
    AppState,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Fogwalk API");

    // Restore persisted state
    let store = JsonStore::open(&config.data_path);
    tracing::info!(path = %config.data_path.display(), "Loading snapshot");
    let notifier = Notifier::default();
    let session = Session::load(&config, store, notifier.clone());

    let overpass = OverpassClient::new(config.overpass_url.clone());
    tracing::info!(endpoint = overpass.endpoint(), "District source configured");

    // Log notifications even when no UI is attached
    tokio::spawn(log_notifications(notifier.subscribe()));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        session: Mutex::new(session),
        overpass,
        notifier,
    });

    // Build router
    let app = fogwalk::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_notifications(mut rx: broadcast::Receiver<Notification>) {
    loop {
        match rx.recv().await {
            Ok(Notification::DistrictUnlocked { id, name }) => {
                tracing::info!(id = %id, name = %name, "District unlocked");
            }
            Ok(event) => tracing::debug!(event = event.name(), "Notification"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fogwalk=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
