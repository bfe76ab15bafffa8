// src/core/commands/string/set.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{ArgParser, extract_bytes};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::{DataValue, StoredValue};
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// Represents the `SET` command: `SET key value [PX milliseconds]`.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub px: Option<u64>,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        if args.len() < 2 {
            return Err(SpinelDBError::WrongArgumentCount("SET".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let value = extract_bytes(&args[1])?;

        let mut parser = ArgParser::new(&args[2..]);
        let px = parser.match_option("px")?;
        if !parser.remaining_args().is_empty() {
            return Err(SpinelDBError::SyntaxError);
        }
        Ok(Set { key, value, px })
    }
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_shard, shard_cache_guard) = ctx.get_single_shard_context_mut()?;

        let expiry = self.px.map(|ms| Instant::now() + Duration::from_millis(ms));

        if expiry.is_some_and(|exp| exp <= Instant::now()) {
            shard_cache_guard.pop(&self.key);
            return Ok((
                RespValue::ok(),
                WriteOutcome::Write { keys_modified: 1 },
            ));
        }

        let new_value = StoredValue {
            data: DataValue::String(self.value.clone()),
            expiry,
        };
        shard_cache_guard.put(self.key.clone(), new_value);

        Ok((RespValue::ok(), WriteOutcome::Write { keys_modified: 1 }))
    }
}
