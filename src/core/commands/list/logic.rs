// src/core/commands/list/logic.rs

use crate::core::commands::command_trait::WriteOutcome;
use crate::core::database::{ExecutionContext, PopDirection, PushDirection};
use crate::core::storage::{DataValue, StoredValue};
use crate::core::{RespValue, SpinelDBError};
use bytes::Bytes;
use std::collections::VecDeque;

/// Shared logic for `LPUSH` and `RPUSH`.
pub(crate) async fn list_push_logic<'a>(
    ctx: &mut ExecutionContext<'a>,
    key: &Bytes,
    values: &[Bytes],
    direction: PushDirection,
) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
    if values.is_empty() {
        let (_, shard_cache_guard) = ctx.get_single_shard_context_mut()?;
        let len = match shard_cache_guard.peek(key) {
            Some(entry) if !entry.is_expired() => match &entry.data {
                DataValue::List(l) => l.len(),
                _ => return Err(SpinelDBError::WrongType),
            },
            _ => 0,
        };
        return Ok((RespValue::Integer(len as i64), WriteOutcome::DidNotWrite));
    }

    // Hand off as many leading values as there are queued BLPOP waiters,
    // FIFO, one value per waiter. Whatever's left still goes into the list.
    let state = ctx.state.clone();
    let consumed = state
        .blocker_manager
        .notify_and_consume_for_push(key, values);
    let remaining = &values[consumed..];

    let (_shard, shard_cache_guard) = ctx.get_single_shard_context_mut()?;

    if let Some(entry) = shard_cache_guard.peek(key) {
        if entry.is_expired() {
            shard_cache_guard.pop(key);
        } else if !matches!(entry.data, DataValue::List(_)) {
            return Err(SpinelDBError::WrongType);
        }
    }

    if remaining.is_empty() {
        // Every value was handed directly to a waiter; the list itself is untouched.
        let len = match shard_cache_guard.peek(key) {
            Some(entry) => match &entry.data {
                DataValue::List(l) => l.len(),
                _ => return Err(SpinelDBError::WrongType),
            },
            None => 0,
        };
        return Ok((RespValue::Integer(len as i64), WriteOutcome::DidNotWrite));
    }

    if !shard_cache_guard.contains_key(key) {
        shard_cache_guard.put(key.clone(), StoredValue::new(DataValue::List(VecDeque::new())));
    }

    let entry = shard_cache_guard.get_mut(key).unwrap();
    let DataValue::List(list) = &mut entry.data else {
        return Err(SpinelDBError::WrongType);
    };
    for value in remaining {
        match direction {
            PushDirection::Left => list.push_front(value.clone()),
            PushDirection::Right => list.push_back(value.clone()),
        }
    }
    let final_len = list.len() as i64;
    Ok((
        RespValue::Integer(final_len),
        WriteOutcome::Write { keys_modified: 1 },
    ))
}

/// Shared logic for `LPOP key [count]`. Pops up to `count` elements (or a
/// single one if `count` is `None`) from the head of the list, returning the
/// values popped in pop order.
pub(crate) async fn list_pop_logic<'a>(
    ctx: &mut ExecutionContext<'a>,
    key: &Bytes,
    direction: PopDirection,
    count: Option<usize>,
) -> Result<(Vec<Bytes>, WriteOutcome), SpinelDBError> {
    let (_shard, shard_cache_guard) = ctx.get_single_shard_context_mut()?;

    let Some(entry) = shard_cache_guard.get_mut(key) else {
        return Ok((Vec::new(), WriteOutcome::DidNotWrite));
    };
    if entry.is_expired() {
        shard_cache_guard.pop(key);
        return Ok((Vec::new(), WriteOutcome::DidNotWrite));
    }

    let DataValue::List(list) = &mut entry.data else {
        return Err(SpinelDBError::WrongType);
    };

    let n = count.unwrap_or(1);
    let mut popped = Vec::with_capacity(n.min(list.len()));
    for _ in 0..n {
        let Some(val) = (match direction {
            PopDirection::Left => list.pop_front(),
            PopDirection::Right => list.pop_back(),
        }) else {
            break;
        };
        popped.push(val);
    }

    let is_now_empty = list.is_empty();
    let outcome = if popped.is_empty() {
        WriteOutcome::DidNotWrite
    } else if is_now_empty {
        shard_cache_guard.pop(key);
        WriteOutcome::Delete { keys_deleted: 1 }
    } else {
        WriteOutcome::Write { keys_modified: 1 }
    };
    Ok((popped, outcome))
}
