// src/core/commands/list/llen.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `LLEN` command.
#[derive(Debug, Clone, Default)]
pub struct LLen {
    pub key: Bytes,
}

impl ParseCommand for LLen {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 1, "LLEN")?;
        Ok(LLen {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for LLen {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_, shard_cache_guard) = ctx.get_single_shard_context_mut()?;
        let len = match shard_cache_guard.peek(&self.key) {
            Some(entry) if !entry.is_expired() => match &entry.data {
                DataValue::List(l) => l.len(),
                _ => return Err(SpinelDBError::WrongType),
            },
            _ => 0,
        };
        Ok((RespValue::Integer(len as i64), WriteOutcome::DidNotWrite))
    }
}
