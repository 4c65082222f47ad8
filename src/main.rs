// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rideshare Map API Server
//!
//! Serves map and rides-list view models to the ride-sharing web client.

use rideshare_map::{
    config::Config,
    services::{BackendClient, SessionStore},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Rideshare Map API");

    let backend = BackendClient::new(&config.backend_url, config.backend_timeout)?;
    tracing::info!(
        backend = %backend.base_url(),
        timeout_secs = config.backend_timeout.as_secs(),
        policy = ?config.unmatched_ride_policy,
        "Backend client initialized"
    );

    let sessions = SessionStore::new();
    sessions.spawn_sweeper(config.session_idle_timeout, SESSION_SWEEP_INTERVAL);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        backend,
        sessions,
    });

    // Build router
    let app = rideshare_map::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rideshare_map=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
