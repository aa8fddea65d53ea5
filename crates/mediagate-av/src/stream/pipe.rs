use std::io::SeekFrom;
use std::time::Duration;

use async_trait::async_trait;
use mediagate_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tracing::{debug, trace, warn};

use super::{SourceKind, StreamSource};
use crate::command::TranscodeCommand;

/// Stdout of a transcoder process, spawned on `open`.
///
/// The pipe is forward-only: `tell` reports the number of bytes read and the
/// only seek accepted is one to the current position.
#[derive(Debug)]
pub struct PipeSource {
    command: TranscodeCommand,
    grace: Duration,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    pid: Option<u32>,
    pos: u64,
}

impl PipeSource {
    /// `grace` is how long the process may take to exit after SIGTERM.
    pub fn new(command: TranscodeCommand, grace: Duration) -> Self {
        Self {
            command,
            grace,
            child: None,
            stdout: None,
            pid: None,
            pos: 0,
        }
    }

    pub fn command(&self) -> &TranscodeCommand {
        &self.command
    }

    fn stdout(&mut self) -> Result<&mut ChildStdout> {
        let (command, pid) = (&self.command, self.pid);
        self.stdout.as_mut().ok_or_else(|| {
            Error::handle_state(describe_pipe(command, pid), "transcoder output is not open")
        })
    }
}

fn describe_pipe(command: &TranscodeCommand, pid: Option<u32>) -> String {
    match pid {
        Some(pid) => format!("pipe:{}[{pid}]", command.program_name()),
        None => format!("pipe:{}", command.program_name()),
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!(pid, error = %e, "SIGTERM failed");
        }
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}

#[async_trait]
impl StreamSource for PipeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pipe
    }

    fn describe(&self) -> String {
        describe_pipe(&self.command, self.pid)
    }

    async fn open(&mut self) -> Result<()> {
        let mut child = self.command.spawn()?;
        let tool = self.command.program_name();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool(tool.clone(), "stdout was not captured"))?;

        if let Some(stderr) = child.stderr.take() {
            let tool = tool.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    trace!(tool = %tool, "{line}");
                }
            });
        }

        self.pid = child.id();
        self.child = Some(child);
        self.stdout = Some(stdout);
        self.pos = 0;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.stdout()?.read(buf).await?;
        self.pos += n as u64;
        Ok(n)
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let stays = match pos {
            SeekFrom::Current(0) => true,
            SeekFrom::Start(n) => n == self.pos,
            _ => false,
        };
        if stays {
            Ok(self.pos)
        } else {
            Err(Error::handle_state(
                self.describe(),
                "transcoder output can only be read forward",
            ))
        }
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.pos)
    }

    async fn close(&mut self) -> Result<()> {
        // Closing our end first lets well-behaved tools exit on EPIPE.
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let pid = self.pid;

        if let Some(status) = child.try_wait()? {
            debug!(?pid, %status, "transcoder already exited");
            return Ok(());
        }

        terminate(&mut child);
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?pid, %status, "transcoder terminated");
            }
            Err(_) => {
                warn!(
                    ?pid,
                    grace_ms = self.grace.as_millis() as u64,
                    "transcoder ignored SIGTERM; killing"
                );
                child.kill().await?;
            }
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.stdout = None;
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }

    fn process_id(&self) -> Option<u32> {
        self.pid
    }
}
