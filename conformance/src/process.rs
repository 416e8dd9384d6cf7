//! Transport to a platform living in another process.
//!
//! The child speaks length-prefixed frames on stdin/stdout (see
//! [`scmi_core::frame`]); its stderr is inherited so its logs interleave with
//! ours. I/O runs on a private current-thread tokio runtime so every command
//! can carry a receive timeout.

use std::process::Stdio;
use std::time::Duration;

use scmi_core::frame;
use scmi_core::transport::TokenCounter;
use scmi_core::{ChannelError, MessageHeader, Response, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace, warn};

/// Default time to wait for one response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ProcessTransport {
    runtime: tokio::runtime::Runtime,
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    tokens: TokenCounter,
    timeout: Duration,
}

impl ProcessTransport {
    pub fn spawn(program: &str, args: &[String], timeout: Duration) -> Result<Self, ChannelError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut child = {
            let _guard = runtime.enter();
            Command::new(program)
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()?
        };
        debug!(program, ?args, pid = child.id(), "spawned platform process");

        let stdin = child.stdin.take().ok_or(ChannelError::Closed)?;
        let stdout = child.stdout.take().ok_or(ChannelError::Closed)?;

        Ok(Self {
            runtime,
            child,
            stdin,
            stdout,
            tokens: TokenCounter::new(),
            timeout,
        })
    }
}

async fn exchange(
    stdin: &mut ChildStdin,
    stdout: &mut ChildStdout,
    command: &[u8],
) -> Result<Response, ChannelError> {
    stdin.write_all(command).await?;
    stdin.flush().await?;

    let mut prefix = [0u8; 4];
    match stdout.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ChannelError::Closed);
        }
        Err(e) => return Err(e.into()),
    }

    let mut body = vec![0u8; frame::body_len(prefix)?];
    stdout.read_exact(&mut body).await?;
    Ok(frame::decode_response(&body)?)
}

impl Transport for ProcessTransport {
    fn send(&mut self, header: MessageHeader, params: &[u32]) -> Result<Response, ChannelError> {
        let header = header.with_token(self.tokens.next_token());
        let command = frame::encode_command(header, params);
        trace!(%header, params = params.len(), "sending command to platform process");

        let Self {
            runtime,
            stdin,
            stdout,
            timeout,
            ..
        } = self;
        let timeout = *timeout;

        runtime.block_on(async move {
            tokio::time::timeout(timeout, exchange(stdin, stdout, &command))
                .await
                .map_err(|_| ChannelError::Timeout(timeout))?
        })
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!("failed to stop platform process: {e}");
        }
    }
}
