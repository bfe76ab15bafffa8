// src/core/blocking.rs

//! Manages clients that are blocked waiting for data to arrive on list keys
//! (`BLPOP`).

use crate::core::commands::command_trait::WriteOutcome;
use crate::core::commands::list::logic::list_pop_logic;
use crate::core::database::{ExecutionContext, PopDirection};
use crate::core::{RespValue, SpinelDBError};
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

/// The value handed to a waiter when a blocking list pop is satisfied.
#[derive(Debug, Clone)]
pub struct PoppedValue {
    pub key: Bytes,
    pub value: Bytes,
}

/// The result of waiting on a oneshot waker.
#[derive(Debug)]
enum BlockerOutcome {
    Woken(PoppedValue),
    TimedOut,
}

/// The waker sends the woken value, eliminating the need for a re-read.
type Waker = oneshot::Sender<PoppedValue>;

/// A shareable waker. The `Option` allows it to be `take()`-n to prevent multiple sends.
type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Holds information about a waiting client, including its session ID for cleanup.
#[derive(Clone, Debug)]
struct WaiterInfo {
    session_id: u64,
    waker: SharedWaker,
}

/// Manages all clients currently blocked on list commands (`BLPOP`).
#[derive(Debug, Default)]
pub struct BlockerManager {
    // Key: the name of the key being watched.
    // Value: a queue of waiters for clients waiting on this key.
    waiters: DashMap<Bytes, VecDeque<WaiterInfo>>,
}

impl BlockerManager {
    /// Creates a new, empty `BlockerManager`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Orchestrates the blocking list pop operation (`BLPOP`).
    pub async fn orchestrate_blocking_pop(
        self: &Arc<Self>,
        ctx: &mut ExecutionContext<'_>,
        keys: &[Bytes],
        direction: PopDirection,
        wait_timeout: Duration,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        // 1. Attempt a non-blocking pop across all keys first.
        for key in keys {
            let (popped, outcome) = list_pop_logic(ctx, key, direction, Some(1)).await?;
            if let Some(value) = popped.into_iter().next() {
                return Ok((
                    RespValue::Array(vec![
                        RespValue::BulkString(key.clone()),
                        RespValue::BulkString(value),
                    ]),
                    outcome,
                ));
            }
        }

        // 2. Prepare for blocking if no data was found.
        let (tx, mut rx) = oneshot::channel();
        let shared_waker = Arc::new(Mutex::new(Some(tx)));
        let waiter_info = WaiterInfo {
            session_id: ctx.session_id,
            waker: shared_waker.clone(),
        };

        // 3. Register the waker BEFORE releasing locks to prevent a race condition
        // where a push happens after the non-blocking check but before we start waiting.
        for key in keys {
            self.waiters
                .entry(key.clone())
                .or_default()
                .push_back(waiter_info.clone());
        }
        debug!(
            "Session {}: Registered to block on keys: {:?}",
            ctx.session_id, keys
        );

        // 4. Release locks and enter the blocking wait.
        ctx.release_locks();
        let block_result = self.wait_with_polling(&mut rx, wait_timeout).await;

        // 5. Process the result and clean up the waiter.
        self.remove_waiter(keys, &shared_waker);

        match block_result {
            BlockerOutcome::TimedOut => Ok((RespValue::NullArray, WriteOutcome::DidNotWrite)),
            BlockerOutcome::Woken(popped) => Ok((
                RespValue::Array(vec![
                    RespValue::BulkString(popped.key),
                    RespValue::BulkString(popped.value),
                ]),
                // The write was handled by the notifying command (e.g., LPUSH).
                WriteOutcome::DidNotWrite,
            )),
        }
    }

    /// Waits for a waker to fire, or for `wait_timeout` to elapse.
    async fn wait_with_polling(
        &self,
        rx: &mut oneshot::Receiver<PoppedValue>,
        wait_timeout: Duration,
    ) -> BlockerOutcome {
        match timeout(wait_timeout, rx).await {
            Ok(Ok(popped)) => BlockerOutcome::Woken(popped),
            _ => BlockerOutcome::TimedOut,
        }
    }

    /// Called by list write commands (`LPUSH`/`RPUSH`). Hands off as many
    /// leading values from `values` as there are queued waiters, one value
    /// per waiter in FIFO registration order, waking each as it's matched.
    /// Returns how many values were consumed this way; the caller is
    /// responsible for storing whatever's left past that count.
    pub fn notify_and_consume_for_push(&self, key: &Bytes, values: &[Bytes]) -> usize {
        let mut consumed = 0;
        while consumed < values.len() {
            let Some(mut queue) = self.waiters.get_mut(key) else {
                break;
            };
            let Some(waiter_info) = queue.front().cloned() else {
                break;
            };

            // Clean up stale waiters whose receivers have been dropped (e.g., timeout).
            if waiter_info.waker.lock().unwrap().is_none() {
                queue.pop_front();
                continue;
            }

            // Attempt to take the waker and send the next value.
            let Some(waker) = queue
                .pop_front()
                .and_then(|info| info.waker.lock().unwrap().take())
            else {
                continue;
            };
            drop(queue);

            let popped_value = PoppedValue {
                key: key.clone(),
                value: values[consumed].clone(),
            };
            if waker.send(popped_value).is_ok() {
                debug!(
                    "Atomically handed off value to a waiter for list key '{}'",
                    String::from_utf8_lossy(key)
                );
                consumed += 1;
            }
        }
        consumed
    }

    /// Removes a specific waker from all associated key queues.
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

    /// Removes all wakers for a given session_id upon client disconnection.
    pub fn remove_waiters_for_session(&self, session_id: u64) {
        self.waiters.iter_mut().for_each(|mut queue| {
            queue.retain(|info| info.session_id != session_id);
        });
        self.waiters.retain(|_, queue| !queue.is_empty());
        debug!(
            "Removed any pending blockers for session_id {}.",
            session_id
        );
    }
}
