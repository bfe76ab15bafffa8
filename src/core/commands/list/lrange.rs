// src/core/commands/list/lrange.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::DataValue;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct LRange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl ParseCommand for LRange {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 3, "LRANGE")?;
        Ok(LRange {
            key: extract_bytes(&args[0])?,
            start: extract_string(&args[1])?
                .parse()
                .map_err(|_| SpinelDBError::NotAnInteger)?,
            stop: extract_string(&args[2])?
                .parse()
                .map_err(|_| SpinelDBError::NotAnInteger)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for LRange {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_, shard_cache_guard) = ctx.get_single_shard_context_mut()?;
        let resp = if let Some(entry) = shard_cache_guard.get_mut(&self.key) {
            if entry.is_expired() {
                shard_cache_guard.pop(&self.key);
                RespValue::Array(vec![])
            } else if let DataValue::List(list) = &entry.data {
                let len = list.len() as i64;
                if len == 0 {
                    return Ok((RespValue::Array(vec![]), WriteOutcome::DidNotWrite));
                }
                let start = if self.start < 0 {
                    len + self.start
                } else {
                    self.start
                };
                let stop = if self.stop < 0 {
                    len + self.stop
                } else {
                    self.stop
                };
                let start = start.max(0) as usize;
                let stop = stop.min(len - 1) as usize;
                if start as i64 > stop as i64 || start as i64 >= len {
                    return Ok((RespValue::Array(vec![]), WriteOutcome::DidNotWrite));
                }
                let values = list
                    .iter()
                    .skip(start)
                    .take(stop - start + 1)
                    .cloned()
                    .map(RespValue::BulkString)
                    .collect();
                RespValue::Array(values)
            } else {
                return Err(SpinelDBError::WrongType);
            }
        } else {
            RespValue::Array(vec![])
        };
        Ok((resp, WriteOutcome::DidNotWrite))
    }
}
