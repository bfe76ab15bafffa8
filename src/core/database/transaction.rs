// src/core/database/transaction.rs

use super::Db;
use crate::core::SpinelDBError;
use crate::core::commands::Command;
use tracing::debug;

/// The state of an in-progress transaction for one session: whether `MULTI`
/// has been issued and the commands queued since.
#[derive(Debug, Default, Clone)]
pub struct TransactionState {
    pub commands: Vec<Command>,
    pub in_transaction: bool,
}

impl Db {
    /// Starts a new transaction for `session_id`, clearing any stale queue.
    pub fn start_transaction(&self, session_id: u64) {
        let mut tx_state = self.tx_states.entry(session_id).or_default();
        tx_state.commands.clear();
        tx_state.in_transaction = true;
        debug!(session_id, "started transaction");
    }

    /// Queues a command inside an ongoing transaction.
    pub fn queue_command_in_tx(
        &self,
        session_id: u64,
        command: Command,
    ) -> Result<(), SpinelDBError> {
        let mut tx_state = self
            .tx_states
            .get_mut(&session_id)
            .ok_or_else(|| SpinelDBError::InvalidState("command queued without MULTI".into()))?;
        tx_state.commands.push(command);
        debug!(session_id, "queued command in transaction");
        Ok(())
    }

    /// Retrieves and removes the transaction state for a session, as `EXEC` does.
    pub fn take_transaction_state(&self, session_id: u64) -> Option<TransactionState> {
        let state = self.tx_states.remove(&session_id).map(|(_, v)| v);
        if state.is_some() {
            debug!(session_id, "took transaction state for EXEC");
        }
        state
    }

    /// Discards a transaction, clearing the queue for the session.
    ///
    /// Errors if no transaction is active, matching `-ERR DISCARD without MULTI`.
    pub fn discard_transaction(&self, session_id: u64) -> Result<(), SpinelDBError> {
        if self.tx_states.remove(&session_id).is_some() {
            debug!(session_id, "discarded transaction");
            Ok(())
        } else {
            Err(SpinelDBError::InvalidState("DISCARD without MULTI".into()))
        }
    }
}
