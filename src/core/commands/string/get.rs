// src/core/commands/string/get.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `GET` command.
#[derive(Debug, Clone, Default)]
pub struct Get {
    pub key: Bytes,
}

impl ParseCommand for Get {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 1, "GET")?;
        Ok(Get {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Get {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_shard, shard_cache_guard) = ctx.get_single_shard_context_mut()?;

        if matches!(shard_cache_guard.peek(&self.key), Some(entry) if entry.is_expired()) {
            shard_cache_guard.pop(&self.key);
        }

        let reply = match shard_cache_guard.peek(&self.key) {
            Some(entry) => match &entry.data {
                DataValue::String(s) => RespValue::BulkString(s.clone()),
                _ => return Err(SpinelDBError::WrongType),
            },
            None => RespValue::Null,
        };
        Ok((reply, WriteOutcome::DidNotWrite))
    }
}
