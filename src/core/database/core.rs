// src/core/database/core.rs

use super::shard::DbShard;
use super::transaction::TransactionState;
use bytes::Bytes;
use dashmap::DashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

/// The number of shards per database.
pub const NUM_SHARDS: usize = 16;

/// `Db` represents the single database this server exposes, composed of
/// several `DbShard`s to allow concurrent access from independent keys.
#[derive(Debug)]
pub struct Db {
    pub shards: Vec<Arc<DbShard>>,
    /// Per-session transaction queues, keyed by session ID.
    pub tx_states: Arc<DashMap<u64, TransactionState>>,
}

/// Direction for list push operations.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum PushDirection {
    Left,
    Right,
}

/// Direction for list pop operations.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum PopDirection {
    Left,
    Right,
}

impl Db {
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Arc::new(DbShard::new())).collect();
        Self {
            shards,
            tx_states: Arc::new(DashMap::new()),
        }
    }

    /// Calculates the shard index for a given key by hashing it.
    pub fn get_shard_index(&self, key: &Bytes) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    pub fn get_shard(&self, index: usize) -> &Arc<DbShard> {
        &self.shards[index]
    }

    /// Deletes a list of keys from the database, returning the count actually removed.
    pub async fn del(&self, keys: &[Bytes]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        if keys.len() == 1 {
            let key = &keys[0];
            let shard_index = self.get_shard_index(key);
            let mut guard = self.shards[shard_index].entries.lock().await;
            return if guard.pop(key).is_some() { 1 } else { 0 };
        }
        let mut locks = self.lock_shards_for_keys(keys).await;
        let mut count = 0;
        for key in keys {
            let shard_index = self.get_shard_index(key);
            if let Some(guard) = locks.get_mut(&shard_index)
                && guard.pop(key).is_some()
            {
                count += 1;
            }
        }
        count
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Db {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
            tx_states: self.tx_states.clone(),
        }
    }
}
