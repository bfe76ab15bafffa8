// src/core/commands/list/blpop.rs

//! Implements the `BLPOP` command.

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::extract_bytes;
use crate::core::database::{ExecutionContext, PopDirection};
use crate::core::protocol::RespFrame;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Represents the `BLPOP` command with its parsed arguments.
#[derive(Debug, Clone, Default)]
pub struct BLPop {
    pub keys: Vec<Bytes>,
    pub timeout: Duration,
}

impl ParseCommand for BLPop {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        if args.len() < 2 {
            return Err(SpinelDBError::WrongArgumentCount("BLPOP".to_string()));
        }

        let timeout_str = match args.last().unwrap() {
            RespFrame::BulkString(bs) => String::from_utf8_lossy(bs).into_owned(),
            _ => return Err(SpinelDBError::NotAnInteger),
        };
        let timeout_secs: f64 = timeout_str
            .parse()
            .map_err(|_| SpinelDBError::NotAnInteger)?;
        if timeout_secs < 0.0 {
            return Err(SpinelDBError::SyntaxError);
        }

        let keys: Vec<Bytes> = args[..args.len() - 1]
            .iter()
            .map(extract_bytes)
            .collect::<Result<_, _>>()?;

        let timeout_duration = if timeout_secs == 0.0 {
            Duration::from_secs(u64::MAX)
        } else {
            Duration::from_secs_f64(timeout_secs)
        };

        Ok(BLPop {
            keys,
            timeout: timeout_duration,
        })
    }
}

#[async_trait]
impl ExecutableCommand for BLPop {
    /// The complex blocking logic, including race condition prevention, is
    /// delegated to the central `BlockerManager`.
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let state = ctx.state.clone();
        state
            .blocker_manager
            .orchestrate_blocking_pop(ctx, &self.keys, PopDirection::Left, self.timeout)
            .await
    }
}
