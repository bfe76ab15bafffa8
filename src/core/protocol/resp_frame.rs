// src/core/protocol/resp_frame.rs

//! The wire-level RESP (REdis Serialization Protocol) frame type and its
//! incremental codec.
//!
//! This server only ever speaks the RESP2 subset: clients that issue `HELLO`
//! to negotiate RESP3 are out of scope (see the protocol module's design
//! notes), so `RespFrame` carries only the seven RESP2 frame kinds.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::errors::SpinelDBError;

/// A single decoded RESP2 frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Array(Vec<RespFrame>),
    Null,
    NullArray,
}

impl RespFrame {
    /// Convenience constructor for a bulk string built from a byte slice.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespFrame::BulkString(data.into())
    }

    /// Returns the inner bytes if this frame is a `BulkString`, else `None`.
    pub fn as_bulk_bytes(&self) -> Option<&Bytes> {
        match self {
            RespFrame::BulkString(b) => Some(b),
            _ => None,
        }
    }
}

const MAX_INLINE_LEN: usize = 64 * 1024;
const MAX_ARRAY_LEN: i64 = 1024 * 1024;
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Finds the `\r\n` terminator starting no earlier than `src[0]`, returning
/// the index of the `\r`. Returns `None` if the terminator hasn't arrived yet.
fn find_crlf(src: &[u8]) -> Option<usize> {
    if src.len() < 2 {
        return None;
    }
    // memchr-free scan: frames here are short control lines, not payload bytes.
    (0..src.len() - 1).find(|&i| src[i] == b'\r' && src[i + 1] == b'\n')
}

/// Reads one `\r\n`-terminated line from the front of `src` without consuming
/// it. Returns `(line_without_crlf, total_len_including_crlf)`.
fn peek_line(src: &[u8]) -> Result<Option<(&[u8], usize)>, SpinelDBError> {
    match find_crlf(src) {
        Some(pos) => {
            if pos > MAX_INLINE_LEN {
                return Err(SpinelDBError::Protocol("line too long".into()));
            }
            Ok(Some((&src[..pos], pos + 2)))
        }
        None => {
            if src.len() > MAX_INLINE_LEN {
                return Err(SpinelDBError::Protocol("line too long".into()));
            }
            Ok(None)
        }
    }
}

fn parse_i64(bytes: &[u8], ctx: &'static str) -> Result<i64, SpinelDBError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| SpinelDBError::Protocol(format!("invalid {ctx} integer")))
}

/// Attempts to parse exactly one frame from the front of `src`, consuming it
/// on success. Returns `Ok(None)` when more bytes are needed.
fn parse_frame(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    if src.is_empty() {
        return Ok(None);
    }
    let prefix = src[0];
    match prefix {
        b'+' => parse_simple_string(src),
        b'-' => parse_error(src),
        b':' => parse_integer(src),
        b'$' => parse_bulk_string(src),
        b'*' => parse_array(src),
        other => Err(SpinelDBError::Protocol(format!(
            "invalid frame type byte '{}'",
            other as char
        ))),
    }
}

fn parse_simple_string(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    match peek_line(&src[1..])? {
        None => Ok(None),
        Some((line, consumed)) => {
            let s = std::str::from_utf8(line)
                .map_err(|_| SpinelDBError::Protocol("invalid utf8 in simple string".into()))?
                .to_string();
            src.advance(1 + consumed);
            Ok(Some(RespFrame::SimpleString(s)))
        }
    }
}

fn parse_error(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    match peek_line(&src[1..])? {
        None => Ok(None),
        Some((line, consumed)) => {
            let s = std::str::from_utf8(line)
                .map_err(|_| SpinelDBError::Protocol("invalid utf8 in error line".into()))?
                .to_string();
            src.advance(1 + consumed);
            Ok(Some(RespFrame::Error(s)))
        }
    }
}

fn parse_integer(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    match peek_line(&src[1..])? {
        None => Ok(None),
        Some((line, consumed)) => {
            let n = parse_i64(line, "reply")?;
            src.advance(1 + consumed);
            Ok(Some(RespFrame::Integer(n)))
        }
    }
}

fn parse_bulk_string(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    let (len_line, header_len) = match peek_line(&src[1..])? {
        None => return Ok(None),
        Some(x) => x,
    };
    let len = parse_i64(len_line, "bulk length")?;
    if len > MAX_BULK_LEN {
        return Err(SpinelDBError::Protocol("bulk string too long".into()));
    }
    if len < 0 {
        // `$-1\r\n` is a null bulk string.
        src.advance(1 + header_len);
        return Ok(Some(RespFrame::Null));
    }
    let len = len as usize;
    let total_needed = 1 + header_len + len + 2;
    if src.len() < total_needed {
        return Ok(None);
    }
    let data_start = 1 + header_len;
    let data = Bytes::copy_from_slice(&src[data_start..data_start + len]);
    if &src[data_start + len..data_start + len + 2] != b"\r\n" {
        return Err(SpinelDBError::Protocol(
            "missing CRLF after bulk string payload".into(),
        ));
    }
    src.advance(total_needed);
    Ok(Some(RespFrame::BulkString(data)))
}

fn parse_array(src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
    let (len_line, header_len) = match peek_line(&src[1..])? {
        None => return Ok(None),
        Some(x) => x,
    };
    let len = parse_i64(len_line, "array length")?;
    if len > MAX_ARRAY_LEN {
        return Err(SpinelDBError::Protocol("array too long".into()));
    }
    if len < 0 {
        src.advance(1 + header_len);
        return Ok(Some(RespFrame::NullArray));
    }
    let len = len as usize;

    // Parse elements against a scratch copy first: if the array is only
    // partially buffered we must not consume the length header yet, since
    // the next poll will re-enter at `src[0] == '*'`.
    let mut scratch = src.clone();
    scratch.advance(1 + header_len);
    let mut elements = Vec::with_capacity(len);
    for _ in 0..len {
        match parse_frame(&mut scratch)? {
            Some(frame) => elements.push(frame),
            None => return Ok(None),
        }
    }
    let total_consumed = src.len() - scratch.len() + 1 + header_len;
    src.advance(total_consumed);
    Ok(Some(RespFrame::Array(elements)))
}

fn encode_frame(frame: &RespFrame, dst: &mut BytesMut) {
    match frame {
        RespFrame::SimpleString(s) => {
            dst.put_u8(b'+');
            dst.put_slice(s.as_bytes());
            dst.put_slice(b"\r\n");
        }
        RespFrame::Error(s) => {
            dst.put_u8(b'-');
            dst.put_slice(s.as_bytes());
            dst.put_slice(b"\r\n");
        }
        RespFrame::Integer(n) => {
            dst.put_u8(b':');
            let mut buf = itoa::Buffer::new();
            dst.put_slice(buf.format(*n).as_bytes());
            dst.put_slice(b"\r\n");
        }
        RespFrame::BulkString(b) => {
            dst.put_u8(b'$');
            let mut buf = itoa::Buffer::new();
            dst.put_slice(buf.format(b.len() as i64).as_bytes());
            dst.put_slice(b"\r\n");
            dst.put_slice(b);
            dst.put_slice(b"\r\n");
        }
        RespFrame::Null => {
            dst.put_slice(b"$-1\r\n");
        }
        RespFrame::NullArray => {
            dst.put_slice(b"*-1\r\n");
        }
        RespFrame::Array(elements) => {
            dst.put_u8(b'*');
            let mut buf = itoa::Buffer::new();
            dst.put_slice(buf.format(elements.len() as i64).as_bytes());
            dst.put_slice(b"\r\n");
            for el in elements {
                encode_frame(el, dst);
            }
        }
    }
}

/// Incremental `Decoder`/`Encoder` pair driving a `tokio_util::codec::Framed`
/// stream over a raw `AsyncRead + AsyncWrite` connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct RespFrameCodec;

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = SpinelDBError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespFrame>, SpinelDBError> {
        parse_frame(src)
    }
}

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = SpinelDBError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), SpinelDBError> {
        encode_frame(&item, dst);
        Ok(())
    }
}
