// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{filter::EnvFilter, reload};

mod connection_loop;
mod context;
mod initialization;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(
    config: Config,
    log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
) -> Result<()> {
    // 1. Initialize server state and bind the listener.
    let server_context = initialization::setup(config, log_reload_handle).await?;

    // 2. Start the main connection acceptance loop. This runs until shutdown.
    connection_loop::run(server_context).await;

    Ok(())
}
