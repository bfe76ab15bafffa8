// src/core/commands/streams/xadd.rs

//! Implements the `XADD` command for adding entries to a stream.
//!
//! `XADD key id field value [field value ...]` where `id` is `*` (full
//! auto-generation), `<ms>-*` (auto-generated sequence within `ms`), or an
//! explicit `ms-seq` pair that must be strictly greater than the stream's
//! current last ID.

use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand, WriteOutcome};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::database::ExecutionContext;
use crate::core::protocol::RespFrame;
use crate::core::storage::{DataValue, IdSpec, Stream, StoredValue};
use crate::core::{RespValue, SpinelDBError};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct XAdd {
    pub key: Bytes,
    pub id_spec: IdSpec,
    pub fields: IndexMap<Bytes, Bytes>,
}

impl ParseCommand for XAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, SpinelDBError> {
        if args.len() < 4 {
            return Err(SpinelDBError::WrongArgumentCount("XADD".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let id_str = extract_string(&args[1])?;
        let id_spec = parse_id_spec(&id_str)?;

        let field_args = &args[2..];
        if field_args.is_empty() || !field_args.len().is_multiple_of(2) {
            return Err(SpinelDBError::WrongArgumentCount("XADD".to_string()));
        }
        let fields = field_args
            .chunks_exact(2)
            .map(|chunk| Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?)))
            .collect::<Result<_, SpinelDBError>>()?;

        Ok(XAdd {
            key,
            id_spec,
            fields,
        })
    }
}

fn parse_id_spec(id_str: &str) -> Result<IdSpec, SpinelDBError> {
    if id_str == "*" {
        return Ok(IdSpec::Auto);
    }
    if let Some(ms_part) = id_str.strip_suffix("-*") {
        let ms: u64 = ms_part.parse().map_err(|_| SpinelDBError::InvalidState(
            "Invalid stream ID specified as stream command argument".into(),
        ))?;
        return Ok(IdSpec::PartialSeq(ms));
    }
    id_str
        .parse()
        .map(IdSpec::Explicit)
        .map_err(|e: crate::core::storage::stream::StreamIdParseError| {
            SpinelDBError::InvalidState(e.0.to_string())
        })
}

#[async_trait]
impl ExecutableCommand for XAdd {
    async fn execute<'a>(
        &self,
        ctx: &mut ExecutionContext<'a>,
    ) -> Result<(RespValue, WriteOutcome), SpinelDBError> {
        let (_shard, guard) = ctx.get_single_shard_context_mut()?;

        if !guard.contains_key(&self.key) {
            guard.put(self.key.clone(), StoredValue::new(DataValue::Stream(Stream::default())));
        }
        let entry = guard.get_mut(&self.key).unwrap();
        let DataValue::Stream(stream) = &mut entry.data else {
            return Err(SpinelDBError::WrongType);
        };

        let new_id = stream
            .add_entry(self.id_spec, self.fields.clone())
            .map_err(|e| SpinelDBError::InvalidState(e.trim_start_matches("ERR ").to_string()))?;

        ctx.state.stream_blocker_manager.notify(&self.key);

        Ok((
            RespValue::BulkString(new_id.to_string().into()),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}
