// src/core/commands/generic/del.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::extract_bytes;
use crate::core::database::{ExecutionContext, ExecutionLocks};
use crate::core::storage::DataValue;
use crate::core::protocol::RespFrame;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Represents the `DEL` command.
#[derive(Debug, Clone, Default)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for Del {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        if args.is_empty() {
            return Err(SpinelDBError::WrongArgumentCount("DEL".to_string()));
        }
        let keys = args
            .iter()
            .map(extract_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Del { keys })
    }
}

#[async_trait]
impl ExecutableCommand for Del {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let mut count = 0u64;
        let mut post_lock_tasks: Vec<(Bytes, DataValue)> = Vec::new();

        {
            let mut guards = match std::mem::replace(&mut ctx.locks, ExecutionLocks::None) {
                ExecutionLocks::Multi { guards } => guards,
                ExecutionLocks::Single { shard_index, guard } => {
                    let mut map = BTreeMap::new();
                    map.insert(shard_index, guard);
                    map
                }
                _ => {
                    return Err(SpinelDBError::Internal(
                        "DEL requires appropriate lock (Single or Multi)".into(),
                    ));
                }
            };

            for key in &self.keys {
                let shard_index = ctx.db.get_shard_index(key);
                if let Some(guard) = guards.get_mut(&shard_index)
                    && let Some(popped_value) = guard.pop(key)
                    && !popped_value.is_expired()
                {
                    count += 1;
                    post_lock_tasks.push((key.clone(), popped_value.data));
                }
            }
        } // shard locks released here

        for (key, data_value) in post_lock_tasks {
            match data_value {
                DataValue::Stream(_) => {
                    ctx.state.stream_blocker_manager.notify_and_remove_all(&key);
                }
                DataValue::List(_) => {
                    ctx.state
                        .blocker_manager
                        .wake_waiters_for_modification(&key);
                }
                _ => {}
            }
        }

        let outcome = if count > 0 {
            WriteOutcome::Delete {
                keys_deleted: count,
            }
        } else {
            WriteOutcome::DidNotWrite
        };
        Ok((RespValue::Integer(count as i64), outcome))
    }
}
