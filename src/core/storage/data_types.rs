// src/core/storage/data_types.rs

//! Defines the core data structures for storing values in the database:
//! `StoredValue` (value + expiry) and the `DataValue` enum (String/List/Stream).

use super::stream::Stream;
use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Instant;

/// A hard limit on the size of a single string value to prevent DoS via excessive allocation.
pub const MAX_STRING_SIZE: usize = 512 * 1024 * 1024; // 512MB

/// A wrapper for all values stored in the database, containing the data and
/// its optional expiry.
#[derive(Debug, Clone)]
pub struct StoredValue {
    pub data: DataValue,
    /// The instant at which the value is considered expired. Checked lazily
    /// on every read/write path; there is no background sweeper.
    pub expiry: Option<Instant>,
}

impl StoredValue {
    pub fn new(data: DataValue) -> Self {
        Self { data, expiry: None }
    }

    pub fn with_expiry(data: DataValue, expiry: Instant) -> Self {
        Self {
            data,
            expiry: Some(expiry),
        }
    }

    /// Calculates the remaining time-to-live in milliseconds, if any.
    pub fn remaining_ttl_ms(&self) -> Option<i64> {
        self.expiry
            .and_then(|expiry| expiry.checked_duration_since(Instant::now()))
            .map(|d| d.as_millis() as i64)
    }

    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= Instant::now())
    }
}

/// The data types this server supports: strings, lists, and append-only
/// streams.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
}

impl DataValue {
    /// A short type name as used by the `TYPE` command's reply.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::List(_) => "list",
            DataValue::Stream(_) => "stream",
        }
    }

    pub fn memory_usage(&self) -> usize {
        match self {
            DataValue::String(b) => b.len(),
            DataValue::List(l) => l.iter().map(|b| b.len()).sum(),
            DataValue::Stream(s) => s.memory_usage(),
        }
    }
}
