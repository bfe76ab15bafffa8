// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
///
/// `Display` renders each variant exactly as the wire-level RESP error line
/// (minus the leading `-`), so the connection layer can forward
/// `e.to_string()` straight into a `RespFrame::Error` without any further
/// formatting.
#[derive(Error, Debug)]
pub enum SpinelDBError {
    #[error("ERR {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data")]
    IncompleteData,

    #[error("ERR Protocol error: {0}")]
    Protocol(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR {0}")]
    InvalidState(String),

    #[error("ERR {0}")]
    Internal(String),
}

// `std::io::Error` isn't `Clone`, so it's wrapped in an `Arc` to allow this
// error type to be cloned cheaply when shared across a transaction's queued
// results.
impl Clone for SpinelDBError {
    fn clone(&self) -> Self {
        match self {
            SpinelDBError::Io(e) => SpinelDBError::Io(Arc::clone(e)),
            SpinelDBError::IncompleteData => SpinelDBError::IncompleteData,
            SpinelDBError::Protocol(s) => SpinelDBError::Protocol(s.clone()),
            SpinelDBError::UnknownCommand(s) => SpinelDBError::UnknownCommand(s.clone()),
            SpinelDBError::SyntaxError => SpinelDBError::SyntaxError,
            SpinelDBError::WrongArgumentCount(s) => SpinelDBError::WrongArgumentCount(s.clone()),
            SpinelDBError::WrongType => SpinelDBError::WrongType,
            SpinelDBError::NotAnInteger => SpinelDBError::NotAnInteger,
            SpinelDBError::Overflow => SpinelDBError::Overflow,
            SpinelDBError::InvalidState(s) => SpinelDBError::InvalidState(s.clone()),
            SpinelDBError::Internal(s) => SpinelDBError::Internal(s.clone()),
        }
    }
}

impl PartialEq for SpinelDBError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SpinelDBError::Io(e1), SpinelDBError::Io(e2)) => e1.to_string() == e2.to_string(),
            (SpinelDBError::Protocol(s1), SpinelDBError::Protocol(s2)) => s1 == s2,
            (SpinelDBError::UnknownCommand(s1), SpinelDBError::UnknownCommand(s2)) => s1 == s2,
            (SpinelDBError::WrongArgumentCount(s1), SpinelDBError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (SpinelDBError::InvalidState(s1), SpinelDBError::InvalidState(s2)) => s1 == s2,
            (SpinelDBError::Internal(s1), SpinelDBError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for SpinelDBError {
    fn from(e: std::io::Error) -> Self {
        SpinelDBError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for SpinelDBError {
    fn from(_: std::str::Utf8Error) -> Self {
        SpinelDBError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for SpinelDBError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        SpinelDBError::WrongType
    }
}

impl From<ParseIntError> for SpinelDBError {
    fn from(_: ParseIntError) -> Self {
        SpinelDBError::NotAnInteger
    }
}
