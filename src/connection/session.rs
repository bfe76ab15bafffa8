// src/connection/session.rs

//! Defines the state associated with a single client session.

/// Holds the state specific to a single client session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// True if the client is within a `MULTI`/`EXEC` block. Mirrors the
    /// authoritative per-session entry in `Db::tx_states`, so the connection
    /// handler can check it without going through the database.
    pub is_in_transaction: bool,
}

impl SessionState {
    /// Creates a new `SessionState` with default values.
    pub(crate) fn new() -> Self {
        Self::default()
    }
}
