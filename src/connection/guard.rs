// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard to ensure connection resources are always cleaned up when a
/// connection handler's scope is exited.
pub struct ConnectionGuard {
    /// A shared reference to the server state.
    pub(crate) state: Arc<ServerState>,
    /// The unique identifier for the client session.
    pub(crate) session_id: u64,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard`.
    pub(crate) fn new(state: Arc<ServerState>, session_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Performs resource cleanup when the guard goes out of scope.
    /// This includes removing the client from global maps and cleaning up any
    /// pending blockers.
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, cleaning up resources for connection {}",
            self.addr
        );

        // Remove the client from the central client map.
        self.state.clients.remove(&self.session_id);

        // Clean up any potential lingering state from blocking commands.
        self.state
            .blocker_manager
            .remove_waiters_for_session(self.session_id);
        self.state
            .stream_blocker_manager
            .remove_waiters_for_session(self.session_id);
    }
}
