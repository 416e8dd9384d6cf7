//! Wire-level building blocks for SCMI conformance testing.
//!
//! - [`header`]: pack and unpack the 32-bit message header, and decide
//!   whether a response answers a command.
//! - [`bits`]: inclusive bit-range extraction and reserved-bit checks.
//! - [`status`]: the signed status code catalogue.
//! - [`protocol`]: protocol ids, message ids and flag layouts.
//! - [`frame`] and [`transport`]: the [`Transport`] seam and a byte-stream
//!   implementation of it.

#![deny(unsafe_code)]

pub mod bits;
pub mod frame;
pub mod header;
pub mod protocol;
pub mod status;
pub mod transport;

pub use bits::RangeError;
pub use header::{MessageHeader, MessageType, delayed_response_matches, headers_match};
pub use status::StatusCode;
pub use transport::{ChannelError, Response, StreamTransport, Transport};
