// src/server/initialization.rs

//! Handles the complete server initialization process: configuration and
//! state setup, then binding the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, reload};

/// Initializes all server components before starting the main loop.
pub async fn setup(
    config: Config,
    log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let server_state = ServerState::initialize(config, log_reload_handle)?;
    info!("Server state initialized.");

    let listener_config = server_state.config.lock().await;
    let listener = TcpListener::bind((listener_config.host.as_str(), listener_config.port)).await?;
    info!(
        "SpinelDB server listening on {}:{}",
        listener_config.host, listener_config.port
    );
    let connection_permits = Arc::new(Semaphore::new(listener_config.max_clients));
    drop(listener_config);

    Ok(ServerContext {
        state: server_state,
        listener,
        shutdown_tx,
        connection_permits,
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Starting SpinelDB with log level '{}', max_clients {}.",
        config.log_level, config.max_clients
    );
}
