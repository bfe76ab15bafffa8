// src/core/storage/mod.rs

pub mod data_types;
pub mod stream;

pub use data_types::{DataValue, StoredValue};
pub use stream::{IdSpec, Stream, StreamEntry, StreamId};
