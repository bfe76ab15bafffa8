// src/core/commands/command_trait.rs

//! Defines the core traits for all executable commands.

use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;

bitflags! {
    /// Flags describing a command's properties, consulted by the router and
    /// the transaction handler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CommandFlags: u32 {
        /// The command modifies the dataset.
        const WRITE       = 1 << 0;
        /// The command only reads data.
        const READONLY    = 1 << 1;
        /// A command related to transactions (`MULTI`/`EXEC`/`DISCARD`); rejected
        /// if queued inside another transaction.
        const TRANSACTION = 1 << 2;
    }
}

/// The outcome of a write command, used to decide whether the blocking
/// coordinator needs to wake any waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    DidNotWrite,
    Write { keys_modified: u64 },
    Delete { keys_deleted: u64 },
}

/// A composite trait implemented on the `Command` enum, dispatching to each
/// variant's own `ExecutableCommand` impl.
#[async_trait]
pub trait CommandExt {
    fn get_flags(&self) -> CommandFlags;
    fn get_keys(&self) -> Vec<Bytes>;
    fn name(&self) -> &'static str;

    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError>;
}

/// Implemented by each command's struct to provide its execution logic.
#[async_trait]
pub trait ExecutableCommand {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError>;
}

/// Implemented by each command's struct to parse itself from the argument
/// slice that followed the command name in the request array.
pub trait ParseCommand: Sized {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError>;
}
