// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use super::session::SessionState;
use crate::core::handler::command_router::{RouteResponse, Router};
use crate::core::protocol::{RespFrame, RespFrameCodec};
use crate::core::state::ServerState;
use crate::core::{Command, SpinelDBError};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// The next step for the connection's main loop to take.
enum NextAction {
    Continue,
    ExitLoop,
}

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, RespFrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
    global_shutdown_rx: broadcast::Receiver<()>,
    session: SessionState,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            framed: Framed::new(socket, RespFrameCodec),
            addr,
            state,
            session_id,
            shutdown_rx,
            global_shutdown_rx,
            session: SessionState::new(),
        }
    }

    /// The main event loop for the connection, handling incoming frames and signals.
    pub async fn run(&mut self) -> Result<(), SpinelDBError> {
        let _guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);
        'main_loop: loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!("Connection handler for {} received GLOBAL shutdown signal.", self.addr);
                    let shutdown_msg = RespFrame::Error("SHUTDOWN Server is shutting down".to_string());
                    let _ = self.framed.send(shutdown_msg).await;
                    break 'main_loop;
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Connection handler for {} received kill signal.", self.addr);
                    break 'main_loop;
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            debug!("Session {}: Received frame: {:?}", self.session_id, frame);
                            match self.process_frame(frame).await {
                                Ok(NextAction::Continue) => {
                                    self.update_client_last_activity().await;
                                }
                                Ok(NextAction::ExitLoop) => {
                                    break 'main_loop;
                                }
                                Err(e) => {
                                    self.send_error_to_client(e).await?;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break 'main_loop;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break 'main_loop;
                        }
                    }
                }
            }
        }

        // Clean up any lingering transaction state left by a disconnected client.
        if self.state.db.discard_transaction(self.session_id).is_ok() {
            debug!(
                "Cleaned up lingering transaction for client {}.",
                self.addr
            );
        }
        Ok(())
    }

    /// Parses a RESP frame, routes it as a command, and sends the response.
    async fn process_frame(&mut self, frame: RespFrame) -> Result<NextAction, SpinelDBError> {
        let command = Command::try_from(frame)?;
        debug!(
            "Session {}: Received command: {}",
            self.session_id,
            command.name()
        );

        let mut router = Router::new(
            self.state.clone(),
            self.session_id,
            self.addr,
            &mut self.session,
        );
        let route_response = router.route(command).await?;

        match route_response {
            RouteResponse::Single(response) => {
                debug!(
                    "Session {}: Sending response: {:?}",
                    self.session_id, response
                );
                self.framed.send(response.into()).await?;
            }
        }

        Ok(NextAction::Continue)
    }

    /// Sends an error frame back to the client.
    async fn send_error_to_client(&mut self, e: SpinelDBError) -> Result<(), SpinelDBError> {
        let error_frame = RespFrame::Error(e.to_string());
        debug!(
            "Session {}: Sending error response: {:?}",
            self.session_id, error_frame
        );
        self.framed.send(error_frame).await?;
        Ok(())
    }

    /// Updates the client's last activity time for monitoring.
    async fn update_client_last_activity(&self) {
        if let Some(entry) = self.state.clients.get(&self.session_id) {
            entry.value().0.lock().await.last_command_time = Instant::now();
        }
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &SpinelDBError) -> bool {
    matches!(e, SpinelDBError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
