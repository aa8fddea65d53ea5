//! Builder for spawning a streaming transcoder process.

use std::path::PathBuf;
use std::process::Stdio;

use mediagate_core::config::StderrMode;
use mediagate_core::{Error, Result};
use tokio::process::{Child, Command};

/// A transcoder invocation whose output is read from stdout.
///
/// Unlike a run-to-completion tool call, the child is handed back running;
/// it is spawned with `kill_on_drop` so losing the [`Child`] never leaks the
/// process.
///
/// # Example
///
/// ```no_run
/// use mediagate_av::TranscodeCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mediagate_core::Result<()> {
/// let child = TranscodeCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-i").arg("/media/song.flac")
///     .arg("-f").arg("mp3")
///     .arg("-")
///     .spawn()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TranscodeCommand {
    program: PathBuf,
    args: Vec<String>,
    stderr: StderrMode,
}

impl TranscodeCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            stderr: StderrMode::Log,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Choose what happens to the child's stderr.
    pub fn stderr(&mut self, mode: StderrMode) -> &mut Self {
        self.stderr = mode;
        self
    }

    /// Short program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn stderr_mode(&self) -> StderrMode {
        self.stderr
    }

    /// Spawn the process with stdout piped and stdin closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning the process fails.
    pub fn spawn(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true);

        match self.stderr {
            StderrMode::Log => cmd.stderr(Stdio::piped()),
            StderrMode::Discard => cmd.stderr(Stdio::null()),
        };

        cmd.spawn()
            .map_err(|e| Error::tool(self.program_name(), format!("failed to spawn: {e}")))
    }
}
