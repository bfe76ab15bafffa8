// src/core/commands/list/lpop.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::commands::list::logic::list_pop_logic;
use crate::core::database::{ExecutionContext, PopDirection};
use crate::core::protocol::RespFrame;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;

/// `LPOP key [count]`. Without `count`, replies a bulk string (or null if the
/// list is absent/empty). With an explicit `count` — even `1` — replies an
/// array of the popped values.
#[derive(Debug, Clone, Default)]
pub struct LPop {
    pub key: Bytes,
    pub count: Option<usize>,
}

impl ParseCommand for LPop {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        if args.is_empty() || args.len() > 2 {
            return Err(SpinelDBError::WrongArgumentCount("LPOP".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let count = match args.get(1) {
            Some(frame) => Some(
                extract_string(frame)?
                    .parse()
                    .map_err(|_| SpinelDBError::NotAnInteger)?,
            ),
            None => None,
        };
        Ok(LPop { key, count })
    }
}

#[async_trait]
impl ExecutableCommand for LPop {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (popped, outcome) =
            list_pop_logic(ctx, &self.key, PopDirection::Left, self.count).await?;

        let reply = match self.count {
            Some(_) => RespValue::Array(popped.into_iter().map(RespValue::BulkString).collect()),
            None => match popped.into_iter().next() {
                Some(val) => RespValue::BulkString(val),
                None => RespValue::Null,
            },
        };
        Ok((reply, outcome))
    }
}
