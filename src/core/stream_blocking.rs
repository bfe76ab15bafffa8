// src/core/stream_blocking.rs

//! Manages clients that are blocked waiting for data on one or more streams,
//! for the `XREAD` command's `BLOCK` option.

use crate::core::database::ExecutionContext;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::stream::StreamId;
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

/// The result of a stream blocking operation.
#[derive(Debug)]
pub enum StreamBlockerResult {
    /// The client was woken up because new data arrived on a stream.
    Woken,
    /// The blocking operation timed out.
    TimedOut,
}

/// The waker for stream blocking only needs to signal that data has arrived.
type Waker = oneshot::Sender<()>;

/// A shareable, thread-safe waker. The `Option` allows it to be `take()`-n,
/// ensuring it is only used once.
type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Holds information about a waiting client, including its session ID for cleanup.
#[derive(Clone, Debug)]
struct WaiterInfo {
    session_id: u64,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on stream commands.
#[derive(Debug, Default)]
pub struct StreamBlockerManager {
    // Key: the name of the stream being watched.
    // Value: a queue of waiters for clients waiting on this stream.
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

impl StreamBlockerManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// The main orchestrator for blocking on stream keys.
    ///
    /// `initial_ids` must hold each stream's starting ID already resolved by
    /// the caller (in particular, any `$` must already be resolved to a
    /// concrete ID at call time, not re-derived after waking) so that a
    /// client woken by an `XADD` can re-read starting from the same point it
    /// was blocking on, rather than the stream's now-advanced tip.
    ///
    /// 1. Registers a waker *before* releasing the database locks.
    /// 2. Releases locks and waits for a notification or timeout.
    /// 3. After waking, re-acquires locks and verifies the stream's last ID
    ///    actually advanced, to rule out a spurious wakeup.
    pub async fn block_on(
        self: &Arc<Self>,
        ctx: &mut ExecutionContext<'_>,
        keys: &[Bytes],
        wait_timeout: Duration,
        initial_ids: &HashMap<Bytes, StreamId>,
    ) -> StreamBlockerResult {
        let (tx, mut rx) = oneshot::channel();
        let shared_waker = Arc::new(Mutex::new(Some(tx)));
        let waiter_info = WaiterInfo {
            session_id: ctx.session_id,
            waker: shared_waker.clone(),
        };

        // CRITICAL: register the waker BEFORE releasing locks to prevent a race
        // condition with a concurrent XADD on another connection.
        for key in keys {
            self.waiters
                .entry(key.clone())
                .or_default()
                .push_back(waiter_info.clone());
        }
        debug!(
            "Session {}: registered to block on streams: {:?}",
            ctx.session_id, keys
        );

        ctx.release_locks();

        let block_result = match timeout(wait_timeout, &mut rx).await {
            Ok(_) => StreamBlockerResult::Woken,
            Err(_) => StreamBlockerResult::TimedOut,
        };

        self.remove_waiter(keys, &shared_waker);

        if matches!(block_result, StreamBlockerResult::Woken) {
            if ctx.reacquire_locks_for_command().await.is_err() {
                return StreamBlockerResult::TimedOut;
            }
            let mut changed = false;
            if let crate::core::database::ExecutionLocks::Multi { guards } = &mut ctx.locks {
                for key in keys {
                    let initial_id = initial_ids.get(key).copied().unwrap_or_default();
                    let shard_index = ctx.db.get_shard_index(key);
                    let current_id = guards
                        .get(&shard_index)
                        .and_then(|guard| guard.peek(key))
                        .and_then(|entry| match &entry.data {
                            DataValue::Stream(s) => Some(s.last_generated_id),
                            _ => None,
                        })
                        .unwrap_or_default();
                    if current_id > initial_id {
                        changed = true;
                        break;
                    }
                }
            }
            if !changed {
                return StreamBlockerResult::TimedOut;
            }
        }

        block_result
    }

    /// Wakes up all clients waiting on a specific stream. Called by `XADD`.
    pub fn notify(&self, key: &Bytes) {
        if let Some(mut queue) = self.waiters.get_mut(key) {
            if queue.is_empty() {
                return;
            }
            while let Some(info) = queue.pop_front() {
                if let Ok(mut guard) = info.waker.lock()
                    && let Some(waker) = guard.take()
                {
                    let _ = waker.send(());
                }
            }
        }
    }

    /// Notifies and removes all waiters for a stream that is being deleted.
    /// Called by `DEL`.
    pub fn notify_and_remove_all(&self, key: &Bytes) {
        if let Some((_, mut queue)) = self.waiters.remove(key) {
            while let Some(info) = queue.pop_front() {
                if let Ok(mut guard) = info.waker.lock()
                    && let Some(waker) = guard.take()
                {
                    let _ = waker.send(());
                }
            }
        }
    }

    /// Cleans up a specific waker from all associated key queues after it's been
    /// used or has timed out.
    fn remove_waiter(&self, keys: &[Bytes], waker_to_remove: &SharedWaker) {
        for key in keys {
            if let Some(mut queue) = self.waiters.get_mut(key) {
                queue.retain(|info| !Arc::ptr_eq(&info.waker, waker_to_remove));
                if queue.is_empty() {
                    drop(queue);
                    self.waiters.remove(key);
                }
            }
        }
    }

    /// Removes all wakers for a given session_id. Called when a client
    /// connection is closed to prevent dangling wakers.
    pub fn remove_waiters_for_session(&self, session_id: u64) {
        self.waiters.iter_mut().for_each(|mut queue| {
            queue.retain(|info| info.session_id != session_id);
        });
        self.waiters.retain(|_, queue| !queue.is_empty());
    }
}
