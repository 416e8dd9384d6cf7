//! The seam between the conformance engine and whatever carries messages to
//! the platform.
//!
//! A transport sends exactly one command and blocks until its reply arrives
//! or the channel fails. Timeouts belong to the transport. Channel failures
//! are reported as [`ChannelError`], never as a protocol status.

use std::io::{Read, Write};
use std::time::Duration;

use core::fmt;

use tracing::trace;

use crate::frame::{self, FrameError};
use crate::header::{MessageHeader, TOKEN_MASK};
use crate::status::StatusCode;

/// One reply from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: MessageHeader,
    pub status: StatusCode,
    pub return_values: Vec<u32>,
}

/// The channel itself failed; nothing can be concluded about the protocol.
#[derive(Debug)]
pub enum ChannelError {
    Closed,
    Io(std::io::Error),
    Timeout(Duration),
    Frame(FrameError),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "channel closed"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Timeout(after) => write!(f, "no response after {after:?}"),
            Self::Frame(e) => write!(f, "malformed frame: {e}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for ChannelError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

/// Sends one command and waits for its reply.
pub trait Transport {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError> {
        (**self).send(header, params)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError> {
        (**self).send(header, params)
    }
}

/// Hands out 10-bit sequence tokens, wrapping.
#[derive(Debug, Default, Clone)]
pub struct TokenCounter {
    next: u16,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&mut self) -> u16 {
        let token = self.next;
        self.next = (self.next + 1) & TOKEN_MASK;
        token
    }
}

/// Transport over any blocking byte stream pair (pipe, serial line, socket).
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
    tokens: TokenCounter,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            tokens: TokenCounter::new(),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W: Write> Transport for StreamTransport<R, W> {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError> {
        let header = header.with_token(self.tokens.next_token());
        trace!(%header, params = params.len(), "sending command");

        self.writer.write_all(&frame::encode_command(header, params))?;
        self.writer.flush()?;

        let body = frame::read_frame(&mut self.reader)?.ok_or(ChannelError::Closed)?;
        let response = frame::decode_response(&body)?;
        trace!(header = %response.header, status = %response.status, "received response");
        Ok(response)
    }
}
