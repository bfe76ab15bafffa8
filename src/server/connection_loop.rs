// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use crate::core::state::ClientInfo;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

// Platform-specific signal handling imports
#[cfg(windows)]
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Waits for a shutdown signal based on the operating system.
/// On Unix, it listens for SIGINT and SIGTERM.
/// On Windows, it listens for Ctrl+C.
async fn await_shutdown_signal() {
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to create SIGINT stream");
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to create SIGTERM stream");

    #[cfg(windows)]
    let mut ctrl_c = signal::ctrl_c().expect("Failed to create Ctrl+C stream");

    tokio::select! {
        _ = async { #[cfg(unix)] { sigint.recv().await; info!("SIGINT received, initiating graceful shutdown."); } } => {},
        _ = async { #[cfg(unix)] { sigterm.recv().await; info!("SIGTERM received, initiating graceful shutdown."); } } => {},
        _ = async { #[cfg(windows)] { ctrl_c.await; info!("Ctrl-C received, initiating graceful shutdown."); } } => {},
    }
}

/// The main server loop that accepts connections and handles graceful shutdown.
pub async fn run(ctx: ServerContext) {
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased; // Prioritize shutdown signals over other events.

            // Wait for a shutdown signal.
            _ = await_shutdown_signal() => {
                break;
            },

            // Accept new incoming TCP connections.
            res = ctx.listener.accept() => {
                if let Ok((socket, addr)) = res {
                    let Ok(permit) = ctx.connection_permits.clone().try_acquire_owned() else {
                        warn!("Rejecting connection from {}: max_clients limit reached.", addr);
                        drop(socket);
                        continue;
                    };

                    info!("Accepted new connection from: {}", addr);
                    ctx.state.stats.increment_total_connections();

                    session_id_counter = session_id_counter.wrapping_add(1);
                    let session_id = session_id_counter;
                    let state_clone = ctx.state.clone();

                    // Create per-connection and global shutdown channels.
                    let (conn_shutdown_tx, conn_shutdown_rx) = broadcast::channel(1);
                    let global_shutdown_rx = ctx.shutdown_tx.subscribe();

                    // Register the new client in the global state.
                    let client_info = Arc::new(Mutex::new(ClientInfo {
                        addr,
                        session_id,
                        created: Instant::now(),
                        last_command_time: Instant::now(),
                    }));
                    state_clone.clients.insert(session_id, (client_info, conn_shutdown_tx));

                    client_tasks.spawn(async move {
                        let _permit = permit;
                        let mut handler = ConnectionHandler::new(socket, addr, state_clone, session_id, conn_shutdown_rx, global_shutdown_rx);
                        if let Err(e) = handler.run().await { warn!("Connection from {} terminated unexpectedly: {}", addr, e); }
                    });
                } else if let Err(e) = res {
                    error!("Failed to accept connection: {}", e);
                }
            },

            // Reap completed client tasks.
            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic() {
                        error!("A client handler panicked: {e:?}");
                }
            },
        }
    }

    // --- Graceful Shutdown Sequence ---
    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
    }

    client_tasks.shutdown().await;
    info!("All client connections closed.");
    info!("Server shutdown complete.");
}
