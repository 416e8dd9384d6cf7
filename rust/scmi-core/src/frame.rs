//! Length-prefixed frame encoding for byte-stream channels.
//!
//! Frame layout (all little-endian):
//! - 4 bytes: body length
//! - command body: header word, then one word per parameter
//! - response body: header word, `i32` status, then one word per return value

use std::io::Read;

use core::fmt;

use crate::header::MessageHeader;
use crate::status::StatusCode;
use crate::transport::{ChannelError, Response};

/// Largest accepted body, in bytes.
pub const MAX_FRAME_BODY: usize = 4 * 128;

const WORD: usize = 4;
const MIN_COMMAND_BODY: usize = WORD;
const MIN_RESPONSE_BODY: usize = 2 * WORD;

/// A body that cannot be a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    TooShort { len: usize, min: usize },
    TooLong { len: usize },
    Misaligned { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len, min } => {
                write!(f, "frame body too short: {len} bytes, need {min}")
            }
            Self::TooLong { len } => {
                write!(f, "frame body too long: {len} bytes, max {MAX_FRAME_BODY}")
            }
            Self::Misaligned { len } => {
                write!(f, "frame body of {len} bytes is not a whole number of words")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Validate a length prefix.
pub fn body_len(prefix: [u8; 4]) -> Result<usize, FrameError> {
    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_FRAME_BODY {
        return Err(FrameError::TooLong { len });
    }
    if len % WORD != 0 {
        return Err(FrameError::Misaligned { len });
    }
    Ok(len)
}

fn check_body(body: &[u8], min: usize) -> Result<(), FrameError> {
    let len = body.len();
    if len < min {
        return Err(FrameError::TooShort { len, min });
    }
    if len > MAX_FRAME_BODY {
        return Err(FrameError::TooLong { len });
    }
    if len % WORD != 0 {
        return Err(FrameError::Misaligned { len });
    }
    Ok(())
}

fn words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks_exact(WORD)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

fn frame(body_words: impl IntoIterator<Item = u32>) -> Vec<u8> {
    let mut buf = vec![0u8; WORD];
    for word in body_words {
        buf.extend_from_slice(&word.to_le_bytes());
    }
    let body_len = (buf.len() - WORD) as u32;
    buf[..WORD].copy_from_slice(&body_len.to_le_bytes());
    buf
}

/// Encode a command, length prefix included.
pub fn encode_command(header: MessageHeader, params: &[u32]) -> Vec<u8> {
    frame(std::iter::once(header.encode()).chain(params.iter().copied()))
}

/// Decode a command body (without its length prefix).
pub fn decode_command(body: &[u8]) -> Result<(MessageHeader, Vec<u32>), FrameError> {
    check_body(body, MIN_COMMAND_BODY)?;
    let mut it = words(body);
    let header = MessageHeader::decode(it.next().unwrap_or_default());
    Ok((header, it.collect()))
}

/// Encode a response, length prefix included.
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(
        [response.header.encode(), response.status.code() as u32]
            .into_iter()
            .chain(response.return_values.iter().copied()),
    )
}

/// Decode a response body (without its length prefix).
pub fn decode_response(body: &[u8]) -> Result<Response, FrameError> {
    check_body(body, MIN_RESPONSE_BODY)?;
    let mut it = words(body);
    let header = MessageHeader::decode(it.next().unwrap_or_default());
    let status = StatusCode(it.next().unwrap_or_default() as i32);
    Ok(Response {
        header,
        status,
        return_values: it.collect(),
    })
}

/// Read one frame body. `Ok(None)` on a clean end of stream before the
/// length prefix.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, ChannelError> {
    let mut prefix = [0u8; WORD];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = body_len(prefix)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}
