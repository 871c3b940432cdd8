//! Protocol codec
//!
//! Tokenizing request lines and encoding replies.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! ┌──────────────────────────────────────────┬──────────┐
//! │ VERB SP arg1 SP arg2 ...  (≤ 64 KiB)     │ [\r]\n   │
//! └──────────────────────────────────────────┴──────────┘
//! ```
//!
//! ### Reply
//! ```text
//! ┌──────────────────────────────┬──────┐
//! │ line                         │ \r\n │   × 0..n
//! └──────────────────────────────┴──────┘
//! ```

use std::io::{BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CinderError, Result};
use super::{Command, Response};

/// Maximum length of one request line, excluding its `\n` or `\r\n` terminator
pub const MAX_LINE_LEN: usize = 64 * 1024;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Request Decoding
// =============================================================================

/// Split a request line into tokens
///
/// Leading/trailing whitespace (including `\r` and `\n`) is trimmed and
/// runs of whitespace never produce empty tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Tokenize and validate one request line
pub fn parse_request(line: &str) -> Result<Command> {
    Command::from_tokens(&tokenize(line))
}

/// Read one request line from a buffered stream
///
/// Bytes accumulate in `buf` across calls, so a read that times out halfway
/// through a line loses nothing. Returns `Ok(None)` at end of stream; a
/// final line without a terminator is still returned. Lines longer than
/// [`MAX_LINE_LEN`] fail with `RequestTooLong` and the rest of that line is
/// left unread.
pub fn read_request<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
    // Room for the longest line plus a CRLF terminator
    let limit = MAX_LINE_LEN + CRLF.len();
    let remaining = limit.saturating_sub(buf.len()) as u64;

    let read = reader.by_ref().take(remaining).read_until(b'\n', buf)?;
    let terminated = buf.last() == Some(&b'\n');

    let content = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
    let content_len = content.strip_suffix(b"\r").unwrap_or(content).len();

    if content_len > MAX_LINE_LEN || (!terminated && buf.len() >= limit) {
        buf.clear();
        return Err(CinderError::RequestTooLong { limit: MAX_LINE_LEN });
    }
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }

    String::from_utf8(std::mem::take(buf))
        .map(Some)
        .map_err(|_| CinderError::Protocol("invalid UTF-8".to_string()))
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Encode a response to bytes, one CRLF-terminated line per reply line
pub fn encode_response(response: &Response) -> Bytes {
    let lines = response.lines();
    let capacity = lines.iter().map(|line| line.len() + CRLF.len()).sum();

    let mut buf = BytesMut::with_capacity(capacity);
    for line in &lines {
        buf.put_slice(line.as_bytes());
        buf.put_slice(CRLF);
    }

    buf.freeze()
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
