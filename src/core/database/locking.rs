// src/core/database/locking.rs

use super::core::{Db, NUM_SHARDS};
use super::shard::ShardCache;
use crate::core::commands::Command;
use crate::core::commands::command_trait::CommandExt;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::MutexGuard;

/// Holds the `MutexGuard`s needed to execute a command, shaped to the
/// number of shards its keys actually touch.
pub enum ExecutionLocks<'a> {
    Single {
        shard_index: usize,
        guard: MutexGuard<'a, ShardCache>,
    },
    Multi {
        guards: BTreeMap<usize, MutexGuard<'a, ShardCache>>,
    },
    All {
        guards: Vec<MutexGuard<'a, ShardCache>>,
    },
    None,
}

impl Db {
    /// Determines and acquires the locking strategy appropriate for `command`,
    /// based on the keys it touches.
    pub async fn determine_locks_for_command<'a>(&'a self, command: &Command) -> ExecutionLocks<'a> {
        let keys = command.get_keys();
        match keys.len() {
            0 => ExecutionLocks::None,
            1 => {
                let shard_index = self.get_shard_index(&keys[0]);
                ExecutionLocks::Single {
                    shard_index,
                    guard: self.get_shard(shard_index).entries.lock().await,
                }
            }
            _ => ExecutionLocks::Multi {
                guards: self.lock_shards_for_keys(&keys).await,
            },
        }
    }

    /// Locks the shards touched by `keys`, sorting shard indices first so
    /// every caller acquires shard mutexes in the same global order —
    /// this is what keeps a multi-key `DEL` or `BLPOP` deadlock-free
    /// against a concurrent command touching an overlapping key set.
    pub async fn lock_shards_for_keys<'a>(
        &'a self,
        keys: &[Bytes],
    ) -> BTreeMap<usize, MutexGuard<'a, ShardCache>> {
        let indices: BTreeSet<usize> = keys.iter().map(|key| self.get_shard_index(key)).collect();
        let mut guards = BTreeMap::new();
        for index in indices {
            guards.insert(index, self.shards[index].entries.lock().await);
        }
        guards
    }

    /// Locks every shard, in a fixed order, for whole-keyspace operations
    /// (namely `EXEC`, which must serialize against every other connection).
    pub async fn lock_all_shards<'a>(&'a self) -> Vec<MutexGuard<'a, ShardCache>> {
        let mut guards = Vec::with_capacity(NUM_SHARDS);
        for i in 0..NUM_SHARDS {
            guards.push(self.shards[i].entries.lock().await);
        }
        guards
    }
}
