// src/core/commands/streams/xrange.rs

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::{DataValue, StreamEntry, StreamId};
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use std::ops::Bound;

#[derive(Debug, Clone, Default)]
pub struct XRange {
    pub key: Bytes,
    pub start: StreamId,
    pub end: StreamId,
}

/// Parses a range boundary. `-` is the minimum ID, `+` the maximum. A bare
/// `<ms>` (no `-seq` part) is completed with seq `0` for a start boundary or
/// seq `u64::MAX` for an end boundary, so it matches any sequence at that ms.
fn parse_boundary(s: &str, is_start: bool) -> Result<StreamId, SpinelDBError> {
    if s == "-" {
        return Ok(StreamId::new(0, 0));
    }
    if s == "+" {
        return Ok(StreamId::new(u64::MAX, u64::MAX));
    }
    let invalid = || SpinelDBError::InvalidState("Invalid stream ID specified as stream command argument".into());
    if let Some((ms_part, seq_part)) = s.split_once('-') {
        let ms: u64 = ms_part.parse().map_err(|_| invalid())?;
        let seq: u64 = seq_part.parse().map_err(|_| invalid())?;
        return Ok(StreamId::new(ms, seq));
    }
    let ms: u64 = s.parse().map_err(|_| invalid())?;
    let seq = if is_start { 0 } else { u64::MAX };
    Ok(StreamId::new(ms, seq))
}

impl ParseCommand for XRange {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        validate_arg_count(args, 3, "XRANGE")?;
        let key = extract_bytes(&args[0])?;
        let start = parse_boundary(&extract_string(&args[1])?, true)?;
        let end = parse_boundary(&extract_string(&args[2])?, false)?;
        Ok(XRange { key, start, end })
    }
}

#[async_trait]
impl ExecutableCommand for XRange {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_, guard) = ctx.get_single_shard_context_mut()?;

        let Some(entry) = guard.peek(&self.key) else {
            return Ok((RespValue::Array(vec![]), WriteOutcome::DidNotWrite));
        };
        if entry.is_expired() {
            return Ok((RespValue::Array(vec![]), WriteOutcome::DidNotWrite));
        }
        let DataValue::Stream(stream) = &entry.data else {
            return Err(SpinelDBError::WrongType);
        };

        let results: Vec<RespValue> = stream
            .entries
            .range((Bound::Included(self.start), Bound::Included(self.end)))
            .map(Self::format_entry)
            .collect();

        Ok((RespValue::Array(results), WriteOutcome::DidNotWrite))
    }
}

impl XRange {
    pub fn format_entry((id, entry): (&StreamId, &StreamEntry)) -> RespValue {
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
