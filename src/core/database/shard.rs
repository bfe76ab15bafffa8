// src/core/database/shard.rs

//! Defines the `DbShard` and `ShardCache` structs, the fundamental storage
//! units within a `Db`.

use crate::core::storage::StoredValue;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A single, concurrent slice of the keyspace: a mutex-guarded `ShardCache`.
#[derive(Debug, Default)]
pub struct DbShard {
    pub entries: Mutex<ShardCache>,
}

impl DbShard {
    pub(super) fn new() -> Self {
        Self::default()
    }
}

/// A plain hash-map keyspace slice. There is no eviction policy in this
/// server, so unlike an LRU-backed cache this never reclaims space on its
/// own — keys leave only via `DEL`/expiry.
#[derive(Debug, Default)]
pub struct ShardCache {
    store: HashMap<Bytes, StoredValue>,
}

impl ShardCache {
    pub fn get(&self, key: &Bytes) -> Option<&StoredValue> {
        self.store.get(key)
    }

    pub fn get_mut(&mut self, key: &Bytes) -> Option<&mut StoredValue> {
        self.store.get_mut(key)
    }

    /// Like `get`, but without implying LRU recency — on this plain hash-map
    /// shard it's identical to `get`. Kept so call sites can be grounded on
    /// the teacher's `peek`-vs-`get` naming.
    pub fn peek(&self, key: &Bytes) -> Option<&StoredValue> {
        self.store.get(key)
    }

    pub fn put(&mut self, key: Bytes, value: StoredValue) -> Option<StoredValue> {
        self.store.insert(key, value)
    }

    pub fn pop(&mut self, key: &Bytes) -> Option<StoredValue> {
        self.store.remove(key)
    }

    pub fn contains_key(&self, key: &Bytes) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &StoredValue)> {
        self.store.iter()
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }
}
