// src/core/commands/generic/type_cmd.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::database::{ExecutionContext, ExecutionLocks};
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// Corresponds to the `TYPE` command.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    pub key: Bytes,
}

impl ParseCommand for TypeInfo {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 1, "TYPE")?;
        Ok(TypeInfo {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for TypeInfo {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let shard_cache_guard = match &mut ctx.locks {
            ExecutionLocks::Single { guard, .. } => guard,
            ExecutionLocks::Multi { guards } => {
                let shard_index = ctx.db.get_shard_index(&self.key);
                guards.get_mut(&shard_index).ok_or_else(|| {
                    SpinelDBError::Internal("Mismatched lock in multi-key command for TYPE".into())
                })?
            }
            _ => return Err(SpinelDBError::Internal("TYPE requires a shard lock".into())),
        };

        let type_name = match shard_cache_guard.peek(&self.key) {
            Some(entry) if !entry.is_expired() => entry.data.type_name(),
            _ => "none",
        };
        Ok((
            RespValue::SimpleString(type_name.to_string()),
            WriteOutcome::DidNotWrite,
        ))
    }
}
