// src/core/storage/stream.rs

//! The append-only stream type: entries keyed by a monotonically increasing
//! `(ms, seq)` pair, with the three ID-resolution modes XADD accepts.

use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// A stream entry ID: a pair of 64-bit integers, ordered lexicographically
/// on `(timestamp_ms, sequence)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub timestamp_ms: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId {
        timestamp_ms: 0,
        sequence: 0,
    };
    pub const MAX: StreamId = StreamId {
        timestamp_ms: u64::MAX,
        sequence: u64::MAX,
    };

    pub fn new(timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            timestamp_ms,
            sequence,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StreamIdParseError(pub &'static str);

impl fmt::Display for StreamIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = StreamIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.len() {
            1 => {
                let timestamp_ms = parts[0]
                    .parse()
                    .map_err(|_| StreamIdParseError("invalid stream ID timestamp"))?;
                Ok(StreamId::new(timestamp_ms, 0))
            }
            2 => {
                let timestamp_ms = parts[0]
                    .parse()
                    .map_err(|_| StreamIdParseError("invalid stream ID timestamp"))?;
                let sequence = parts[1]
                    .parse()
                    .map_err(|_| StreamIdParseError("invalid stream ID sequence"))?;
                Ok(StreamId::new(timestamp_ms, sequence))
            }
            _ => Err(StreamIdParseError("invalid stream ID format")),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.timestamp_ms, self.sequence)
    }
}

/// How an XADD caller specified the ID of the entry being added.
#[derive(Debug, Clone, Copy)]
pub enum IdSpec {
    /// `*` — fully auto-generated from wall-clock time.
    Auto,
    /// `<ms>-*` — explicit timestamp, auto-generated sequence.
    PartialSeq(u64),
    /// `<ms>-<seq>` — fully explicit, must be strictly increasing.
    Explicit(StreamId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: IndexMap<Bytes, Bytes>,
}

impl StreamEntry {
    pub fn memory_usage(&self) -> usize {
        self.fields.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// An append-only stream. Entries are never removed by this server (no
/// `XTRIM`/`XDEL`/consumer groups in scope).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    pub entries: BTreeMap<StreamId, StreamEntry>,
    pub length: u64,
    pub last_generated_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_time_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64
    }

    /// Resolves `id_spec` against the stream's current state and, if valid,
    /// appends the entry. Mirrors the XADD ID rules: `*` auto-generates from
    /// wall-clock time, `<ms>-*` auto-generates only the sequence, and an
    /// explicit `<ms>-<seq>` must be strictly greater than the last ID and
    /// may never be `0-0`.
    pub fn add_entry(
        &mut self,
        id_spec: IdSpec,
        fields: IndexMap<Bytes, Bytes>,
    ) -> Result<StreamId, &'static str> {
        let new_id = match id_spec {
            IdSpec::Auto => {
                let now_ms = Self::current_time_ms();
                if self.last_generated_id.timestamp_ms < now_ms {
                    StreamId::new(now_ms, 0)
                } else {
                    StreamId::new(
                        self.last_generated_id.timestamp_ms,
                        self.last_generated_id.sequence + 1,
                    )
                }
            }
            IdSpec::PartialSeq(ms) => {
                let seq = if self.last_generated_id.timestamp_ms == ms {
                    self.last_generated_id.sequence + 1
                } else if ms == 0 && self.entries.is_empty() {
                    1
                } else {
                    0
                };
                StreamId::new(ms, seq)
            }
            IdSpec::Explicit(id) => {
                if id == StreamId::MIN {
                    return Err("ERR The ID specified in XADD must be greater than 0-0");
                }
                if id <= self.last_generated_id {
                    return Err(
                        "ERR The ID specified in XADD is equal or smaller than the target stream top item",
                    );
                }
                id
            }
        };

        self.entries.insert(new_id, StreamEntry { id: new_id, fields });
        self.last_generated_id = new_id;
        self.length += 1;
        Ok(new_id)
    }

    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(|e| e.memory_usage()).sum()
    }
}
