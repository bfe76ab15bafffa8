// src/core/commands/helpers.rs

//! Helper functions for parsing command arguments from `RespFrame`s. Reduces
//! boilerplate and keeps error handling consistent across commands.

use crate::core::SpinelDBError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;
use std::str::FromStr;

/// A helper for parsing command arguments sequentially, matching optional
/// flags (`NX`, `PX <ms>`, ...) before handing off the remaining positional
/// arguments.
pub struct ArgParser<'a> {
    args: &'a [RespFrame],
    cursor: usize,
}

impl<'a> ArgParser<'a> {
    pub fn new(args: &'a [RespFrame]) -> Self {
        Self { args, cursor: 0 }
    }

    /// Consumes the next argument if it case-insensitively matches `flag_name`.
    pub fn match_flag(&mut self, flag_name: &str) -> bool {
        if let Some(arg_str) = self.peek_str() {
            if arg_str.eq_ignore_ascii_case(flag_name) {
                self.cursor += 1;
                return true;
            }
        }
        false
    }

    /// Consumes `opt_name` and its value if the next argument matches, parsing
    /// the value as `T`.
    pub fn match_option<T>(&mut self, opt_name: &str) -> Result<Option<T>, SpinelDBError>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        if let Some(arg_str) = self.peek_str()
            && arg_str.eq_ignore_ascii_case(opt_name)
        {
            if self.cursor + 1 >= self.args.len() {
                return Err(SpinelDBError::SyntaxError);
            }
            let value_str = extract_string(&self.args[self.cursor + 1])?;
            let parsed_value = value_str
                .parse::<T>()
                .map_err(|_| SpinelDBError::NotAnInteger)?;
            self.cursor += 2;
            return Ok(Some(parsed_value));
        }
        Ok(None)
    }

    pub fn remaining_args(&self) -> &'a [RespFrame] {
        &self.args[self.cursor..]
    }

    fn peek_str(&self) -> Option<String> {
        self.args
            .get(self.cursor)
            .and_then(|frame| extract_string(frame).ok().map(|s| s.to_ascii_lowercase()))
    }
}

/// Extracts a `String` from a `RespFrame::BulkString`.
pub fn extract_string(frame: &RespFrame) -> Result<String, SpinelDBError> {
    if let RespFrame::BulkString(bs) = frame {
        String::from_utf8(bs.to_vec()).map_err(|_| SpinelDBError::WrongType)
    } else {
        Err(SpinelDBError::WrongType)
    }
}

/// Extracts `Bytes` from a `RespFrame::BulkString`.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, SpinelDBError> {
    match frame {
        RespFrame::BulkString(bs) => Ok(bs.clone()),
        _ => Err(SpinelDBError::WrongType),
    }
}

/// Validates that the number of arguments matches an exact expected count.
pub fn validate_arg_count(
    args: &[RespFrame],
    expected: usize,
    cmd: &str,
) -> Result<(), SpinelDBError> {
    if args.len() != expected {
        Err(SpinelDBError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Parses arguments for commands of shape `COMMAND key value1 [value2 ...]`.
pub fn parse_key_and_values(
    args: &[RespFrame],
    min_args: usize,
    cmd: &str,
) -> Result<(Bytes, Vec<Bytes>), SpinelDBError> {
    if args.len() < min_args {
        return Err(SpinelDBError::WrongArgumentCount(cmd.to_string()));
    }
    let key = extract_bytes(&args[0])?;
    let values = args[1..].iter().map(extract_bytes).collect::<Result<_, _>>()?;
    Ok((key, values))
}
