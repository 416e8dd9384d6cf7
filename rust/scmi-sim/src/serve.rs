//! Serve a [`SimulatedPlatform`] over a byte stream, one frame at a time.

use std::io::{Read, Write};

use scmi_core::ChannelError;
use scmi_core::frame;
use tracing::{debug, info, warn};

use crate::platform::SimulatedPlatform;

/// Answer commands until the peer closes the stream.
///
/// A malformed command frame ends the session: there is no header to answer.
pub fn serve<R: Read, W: Write>(
    platform: &mut SimulatedPlatform,
    mut reader: R,
    mut writer: W,
) -> Result<(), ChannelError> {
    loop {
        let Some(body) = frame::read_frame(&mut reader)? else {
            info!(commands = platform.stats().commands, "peer closed the channel");
            return Ok(());
        };

        if platform.faults().channel_down(platform.stats().commands) {
            warn!("channel-down fault reached, closing");
            return Ok(());
        }

        let (header, params) = frame::decode_command(&body)?;
        debug!(%header, params = params.len(), "received command");

        let response = platform.handle(header, &params);
        writer.write_all(&frame::encode_response(&response))?;
        writer.flush()?;
    }
}
