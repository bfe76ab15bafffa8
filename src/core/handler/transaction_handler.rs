// src/core/handler/transaction_handler.rs

//! Manages the logic for transactions: command queuing and atomic execution.

use crate::core::commands::command_trait::{CommandExt, CommandFlags};
use crate::core::database::{Db, ExecutionContext, ExecutionLocks, ShardCache};
use crate::core::state::ServerState;
use crate::core::{Command, RespValue, SpinelDBError};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::MutexGuard;

/// Handles the business logic of a transaction for a single client session.
pub struct TransactionHandler<'a> {
    state: Arc<ServerState>,
    db: &'a Arc<Db>,
    session_id: u64,
}

impl<'a> TransactionHandler<'a> {
    pub fn new(state: Arc<ServerState>, db: &'a Arc<Db>, session_id: u64) -> Self {
        Self {
            state,
            db,
            session_id,
        }
    }

    /// Handles the `MULTI` command, starting a new transaction for the session.
    pub fn handle_multi(&self) -> Result<RespValue, SpinelDBError> {
        if let Some(tx_state) = self.db.tx_states.get(&self.session_id)
            && tx_state.in_transaction
        {
            return Err(SpinelDBError::InvalidState(
                "MULTI calls can not be nested".to_string(),
            ));
        }
        self.db.start_transaction(self.session_id);
        Ok(RespValue::SimpleString("OK".into()))
    }

    /// Handles the queuing of a command after `MULTI` has been called.
    pub fn handle_queueing(&self, command: Command) -> Result<RespValue, SpinelDBError> {
        if command.get_flags().contains(CommandFlags::TRANSACTION) {
            return Ok(RespValue::Error(format!(
                "ERR Command '{}' cannot be used in a transaction",
                command.name()
            )));
        }
        self.db.queue_command_in_tx(self.session_id, command)?;
        Ok(RespValue::SimpleString("QUEUED".into()))
    }

    /// Handles the `DISCARD` command, aborting the transaction.
    pub fn handle_discard(&self) -> Result<RespValue, SpinelDBError> {
        self.db.discard_transaction(self.session_id)?;
        Ok(RespValue::SimpleString("OK".into()))
    }

    /// Handles the `EXEC` command, executing the queued commands atomically
    /// with respect to other connections: every shard the queue touches is
    /// locked once, up front, in shard-index order.
    pub async fn handle_exec(&mut self) -> Result<RespValue, SpinelDBError> {
        let tx_state = self
            .db
            .take_transaction_state(self.session_id)
            .ok_or_else(|| SpinelDBError::InvalidState("EXEC without MULTI".to_string()))?;

        if tx_state.commands.is_empty() {
            return Ok(RespValue::Array(vec![]));
        }

        let all_keys: Vec<Bytes> = {
            let mut keys: Vec<Bytes> = tx_state
                .commands
                .iter()
                .flat_map(|c| c.get_keys())
                .collect();
            keys.sort_unstable();
            keys.dedup();
            keys
        };

        let mut guards = self.db.lock_shards_for_keys(&all_keys).await;
        let responses = self
            .execute_queued_commands(&tx_state.commands, &mut guards)
            .await;

        Ok(RespValue::Array(responses))
    }

    /// Executes the queued commands sequentially within the locked context.
    /// A command's own runtime error does not abort the remaining queued
    /// commands — each outcome is independent and reported inline.
    async fn execute_queued_commands<'b>(
        &self,
        commands: &[Command],
        guards: &'b mut BTreeMap<usize, MutexGuard<'a, ShardCache>>,
    ) -> Vec<RespValue> {
        let mut responses = Vec::with_capacity(commands.len());
        let mut temp_guards = std::mem::take(guards);

        for command in commands {
            let mut ctx = ExecutionContext {
                state: self.state.clone(),
                locks: ExecutionLocks::Multi {
                    guards: temp_guards,
                },
                db: self.db,
                command: Some(command.clone()),
                session_id: self.session_id,
            };

            let result = command.execute(&mut ctx).await;

            temp_guards = match ctx.locks {
                ExecutionLocks::Multi { guards } => guards,
                _ => unreachable!("locks must be Multi during transaction execution"),
            };

            match result {
                Ok((resp, _outcome)) => responses.push(resp),
                Err(e) => responses.push(RespValue::Error(e.to_string())),
            }
        }

        *guards = temp_guards;
        responses
    }
}
