// src/core/commands/string/incr.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::{DataValue, StoredValue};
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `INCR` command.
#[derive(Debug, Clone, Default)]
pub struct Incr {
    pub key: Bytes,
}

impl ParseCommand for Incr {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 1, "INCR")?;
        Ok(Incr {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Incr {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_shard, shard_cache_guard) = ctx.get_single_shard_context_mut()?;

        let expired = matches!(shard_cache_guard.peek(&self.key), Some(e) if e.is_expired());
        if expired {
            shard_cache_guard.pop(&self.key);
        }

        if let Some(entry) = shard_cache_guard.get_mut(&self.key) {
            let DataValue::String(s) = &entry.data else {
                return Err(SpinelDBError::WrongType);
            };
            let current_val: i64 = std::str::from_utf8(s)
                .map_err(|_| SpinelDBError::NotAnInteger)?
                .parse()
                .map_err(|_| SpinelDBError::NotAnInteger)?;
            let new_val = current_val.checked_add(1).ok_or(SpinelDBError::Overflow)?;
            entry.data = DataValue::String(Bytes::from(new_val.to_string()));
            return Ok((
                RespValue::Integer(new_val),
                WriteOutcome::Write { keys_modified: 1 },
            ));
        }

        // Key absent (or just expired above): treat as 0 and increment to 1.
        let new_value = StoredValue::new(DataValue::String(Bytes::from_static(b"1")));
        shard_cache_guard.put(self.key.clone(), new_value);
        Ok((
            RespValue::Integer(1),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}
