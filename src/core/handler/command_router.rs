// src/core/handler/command_router.rs

//! The central component for routing parsed commands to their appropriate handlers.
//!
//! The `Router` receives a parsed `Command` from the `ConnectionHandler` and
//! dispatches it to either the transaction-queueing path or direct execution,
//! recording basic statistics and structured logs along the way.

use super::actions;
use crate::connection::SessionState;
use crate::core::commands::command_trait::CommandExt;
use crate::core::database::{Db, ExecutionContext};
use crate::core::state::ServerState;
use crate::core::{Command, RespValue, SpinelDBError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info_span};

/// The response produced by routing a single command.
pub enum RouteResponse {
    /// A single RESP value, sent back to the client.
    Single(RespValue),
}

/// The `Router` receives a parsed `Command` and directs it through the processing pipeline.
pub struct Router<'a> {
    state: Arc<ServerState>,
    session_id: u64,
    addr: SocketAddr,
    session: &'a mut SessionState,
}

impl<'a> Router<'a> {
    /// Creates a new `Router` for a given session.
    pub fn new(
        state: Arc<ServerState>,
        session_id: u64,
        addr: SocketAddr,
        session: &'a mut SessionState,
    ) -> Self {
        Self {
            state,
            session_id,
            addr,
            session,
        }
    }

    /// The main entry point for routing a command.
    pub async fn route(&mut self, command: Command) -> Result<RouteResponse, SpinelDBError> {
        let command_name = command.name();
        let span = info_span!(
            "command",
            name = %command_name,
            client.addr = %self.addr,
            client.id = %self.session_id,
        );

        async move {
            let start_time = Instant::now();
            self.state.stats.increment_total_commands();

            let result = if self.session.is_in_transaction {
                self.handle_transaction_mode(command).await
            } else {
                self.handle_normal_command(command).await
            };

            debug!(
                client.id = self.session_id,
                latency_us = start_time.elapsed().as_micros() as u64,
                "command processed"
            );

            result
        }
        .instrument(span)
        .await
    }

    /// Handles commands when the session is inside a `MULTI`/`EXEC` block.
    async fn handle_transaction_mode(
        &mut self,
        command: Command,
    ) -> Result<RouteResponse, SpinelDBError> {
        // Transaction control commands are handled by the normal flow. This
        // includes a nested `MULTI`, so it reaches `handle_multi`'s own
        // nesting check instead of being rejected here as an ordinary
        // command queued inside a transaction.
        if matches!(command, Command::Exec | Command::Discard | Command::Multi) {
            return self.handle_normal_command(command).await;
        }

        let db = self.state.db.clone();
        super::transaction_handler::TransactionHandler::new(
            self.state.clone(),
            &db,
            self.session_id,
        )
        .handle_queueing(command)
        .map(RouteResponse::Single)
    }

    /// Handles the normal command flow by dispatching to specialized handlers or the generic executor.
    async fn handle_normal_command(
        &mut self,
        command: Command,
    ) -> Result<RouteResponse, SpinelDBError> {
        let db = self.state.db.clone();
        let state = self.state.clone();

        match command {
            Command::Multi => {
                actions::transaction::handle_multi(&db, self.session, state, self.session_id)
            }
            Command::Exec => {
                actions::transaction::handle_exec(&db, self.session, state, self.session_id).await
            }
            Command::Discard => {
                actions::transaction::handle_discard(&db, self.session, state, self.session_id)
            }

            // All other standard commands are executed through the generic path.
            cmd => self.execute_command(cmd, &db).await,
        }
    }

    /// Executes a standard command and returns its response.
    async fn execute_command(
        &mut self,
        command: Command,
        db: &Arc<Db>,
    ) -> Result<RouteResponse, SpinelDBError> {
        let locks = db.determine_locks_for_command(&command).await;
        let mut ctx = ExecutionContext {
            state: self.state.clone(),
            locks,
            db,
            command: Some(command.clone()),
            session_id: self.session_id,
        };
        let (resp_value, _write_outcome) = command.execute(&mut ctx).await?;
        Ok(RouteResponse::Single(resp_value))
    }
}
