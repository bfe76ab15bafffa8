// src/core/commands/streams/xread.rs

//! Implements the `XREAD` command for reading entries from one or more streams.

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::database::{ExecutionContext, ExecutionLocks};
use crate::core::protocol::RespFrame;
use crate::core::storage::{DataValue, StreamEntry, StreamId};
use crate::core::stream_blocking::StreamBlockerResult;
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::ops::Bound;
use std::time::Duration;

/// The starting ID for an `XREAD` command on a specific stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamIdSpec {
    /// An exact ID (e.g., "12345-0").
    Exact(StreamId),
    /// The current last entry in the stream ('$'): wait for entries strictly
    /// after whatever the stream's tip is at call time.
    Last,
}

#[derive(Debug, Clone, Default)]
pub struct XRead {
    pub streams: Vec<(Bytes, StreamIdSpec)>,
    pub block_timeout: Option<Duration>,
}

impl ParseCommand for XRead {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        let mut cmd = XRead::default();
        let mut i = 0;

        while i < args.len() {
            let Ok(arg_str) = extract_string(&args[i]) else {
                break;
            };
            match arg_str.to_ascii_lowercase().as_str() {
                "block" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(SpinelDBError::SyntaxError);
                    }
                    let ms: u64 = extract_string(&args[i])?.parse()?;
                    cmd.block_timeout = Some(Duration::from_millis(ms));
                    i += 1;
                }
                "streams" => {
                    i += 1;
                    break;
                }
                _ => return Err(SpinelDBError::SyntaxError),
            }
        }

        let remaining_args = &args[i..];
        let num_args = remaining_args.len();
        if num_args == 0 || !num_args.is_multiple_of(2) {
            return Err(SpinelDBError::WrongArgumentCount("XREAD".to_string()));
        }

        let num_streams = num_args / 2;
        let keys = &remaining_args[0..num_streams];
        let ids = &remaining_args[num_streams..];

        for (key_frame, id_frame) in keys.iter().zip(ids.iter()) {
            let key = extract_bytes(key_frame)?;
            let id_str = extract_string(id_frame)?;
            let id_spec = if id_str == "$" {
                StreamIdSpec::Last
            } else {
                StreamIdSpec::Exact(
                    id_str
                        .parse::<StreamId>()
                        .map_err(|e| SpinelDBError::InvalidState(e.to_string()))?,
                )
            };
            cmd.streams.push((key, id_spec));
        }

        if cmd.streams.is_empty() {
            return Err(SpinelDBError::WrongArgumentCount("XREAD".to_string()));
        }

        Ok(cmd)
    }
}

#[async_trait]
impl ExecutableCommand for XRead {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        // `collect_entries` and the stream blocker both index into a
        // `Multi` lock map, even for a single stream, so upgrade eagerly —
        // the single-key case otherwise arrives as a `Single` lock.
        let stream_keys: Vec<Bytes> = self.streams.iter().map(|(k, _)| k.clone()).collect();
        ctx.upgrade_locks(&stream_keys).await;

        // Resolve each `$` to the stream's current tip exactly once, up front.
        // The same resolved IDs are reused for the post-wake re-read so a
        // newly-arrived entry isn't masked by re-resolving `$` against the
        // stream's now-advanced tip.
        let start_ids = self.resolve_start_ids(ctx).await?;
        let initial_results = self.collect_entries(ctx, &start_ids).await?;

        if !initial_results.is_empty() || self.block_timeout.is_none() {
            let response = if initial_results.is_empty() {
                RespValue::NullArray
            } else {
                Self::format_results_array(initial_results)
            };
            return Ok((response, WriteOutcome::DidNotWrite));
        }

        let timeout = self.block_timeout.unwrap();

        let state = ctx.state.clone();
        let block_result = state
            .stream_blocker_manager
            .block_on(ctx, &stream_keys, timeout, &start_ids)
            .await;

        match block_result {
            StreamBlockerResult::TimedOut => Ok((RespValue::NullArray, WriteOutcome::DidNotWrite)),
            StreamBlockerResult::Woken => {
                let final_results = self.collect_entries(ctx, &start_ids).await?;
                let response = if final_results.is_empty() {
                    RespValue::NullArray
                } else {
                    Self::format_results_array(final_results)
                };
                Ok((response, WriteOutcome::DidNotWrite))
            }
        }
    }
}

impl XRead {
    fn format_results_array(results: Vec<(Bytes, Vec<StreamEntry>)>) -> RespValue {
        let response_array: Vec<RespValue> = results
            .into_iter()
            .map(|(stream_name, entries)| {
                let entry_values: Vec<RespValue> = entries
                    .into_iter()
                    .map(|entry| Self::format_entry(&entry.id, &entry))
                    .collect();
                RespValue::Array(vec![
                    RespValue::BulkString(stream_name),
                    RespValue::Array(entry_values),
                ])
            })
            .collect();
        RespValue::Array(response_array)
    }

    /// Resolves each stream's requested starting ID to a concrete `StreamId`,
    /// turning `$` into the stream's current tip. Must be called exactly once
    /// per `XREAD`, before any blocking starts, and the result reused for
    /// every subsequent read so a post-wake re-read doesn't re-resolve `$`
    /// against the stream's now-advanced tip.
    async fn resolve_start_ids<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<HashMap<Bytes, StreamId>, SpinelDBError> {
        let guards = match &mut ctx.locks {
            ExecutionLocks::Multi { guards } => guards,
            _ => {
                return Err(SpinelDBError::Internal(
                    "XREAD requires a multi-key lock".into(),
                ));
            }
        };

        let mut resolved_streams = HashMap::with_capacity(self.streams.len());
        for (key, id_spec) in &self.streams {
            let id = match id_spec {
                StreamIdSpec::Exact(id) => *id,
                StreamIdSpec::Last => {
                    let shard_index = ctx.db.get_shard_index(key);
                    guards
                        .get(&shard_index)
                        .and_then(|guard| guard.peek(key))
                        .and_then(|e| match &e.data {
                            DataValue::Stream(s) => Some(s.last_generated_id),
                            _ => None,
                        })
                        .unwrap_or_default()
                }
            };
            resolved_streams.insert(key.clone(), id);
        }
        Ok(resolved_streams)
    }

    /// Reads entries strictly newer than each stream's already-resolved
    /// starting ID (see `resolve_start_ids`).
    async fn collect_entries<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
        start_ids: &HashMap<Bytes, StreamId>,
    ) -> Result<Vec<(Bytes, Vec<StreamEntry>)>, SpinelDBError> {
        let mut results = Vec::new();
        let guards = match &mut ctx.locks {
            ExecutionLocks::Multi { guards } => guards,
            _ => {
                return Err(SpinelDBError::Internal(
                    "XREAD requires a multi-key lock".into(),
                ));
            }
        };

        for (key, start_id) in start_ids {
            let shard_index = ctx.db.get_shard_index(key);
            if let Some(guard) = guards.get(&shard_index)
                && let Some(entry) = guard.peek(key)
                && !entry.is_expired()
                && let DataValue::Stream(stream) = &entry.data
            {
                let stream_results: Vec<StreamEntry> = stream
                    .entries
                    .range((Bound::Excluded(*start_id), Bound::Unbounded))
                    .map(|(_, se)| se.clone())
                    .collect();

                if !stream_results.is_empty() {
                    results.push((key.clone(), stream_results));
                }
            }
        }
        Ok(results)
    }

    pub fn format_entry(id: &StreamId, entry: &StreamEntry) -> RespValue {
        let mut fields_array = Vec::with_capacity(entry.fields.len() * 2);
        for (k, v) in &entry.fields {
            fields_array.push(RespValue::BulkString(k.clone()));
            fields_array.push(RespValue::BulkString(v.clone()));
        }
        RespValue::Array(vec![
            RespValue::BulkString(id.to_string().into()),
            RespValue::Array(fields_array),
        ])
    }
}
