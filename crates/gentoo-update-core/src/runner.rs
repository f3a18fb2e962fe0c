//! External command execution
//!
//! Portage tools are treated as opaque processes: the workflow only looks
//! at their exit status and, for listings, their standard output.

use std::fmt;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info};

use crate::config::ExternalCommand;
use crate::error::{Error, Result};
use crate::plan::RawOutput;

/// How an external command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    code: Option<i32>,
}

impl CommandStatus {
    /// Status with the given exit code (`None` when killed by a signal)
    pub fn from_code(code: Option<i32>) -> Self {
        Self { code }
    }

    /// Successful exit
    pub fn success() -> Self {
        Self::from_code(Some(0))
    }

    /// Whether the command exited with code 0
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code, if the process exited normally
    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self::from_code(status.code())
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "termination by signal"),
        }
    }
}

/// Output captured from a listing command
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub output: RawOutput,
}

/// Seam between the workflow and the processes it starts
pub trait CommandRunner {
    /// Run a command attached to the terminal
    fn run(&mut self, command: &ExternalCommand) -> Result<CommandStatus>;

    /// Run a command and capture its standard output
    fn capture(&mut self, command: &ExternalCommand) -> Result<CapturedOutput>;

    /// Run a command and turn a non-zero exit into [`Error::CommandFailed`]
    fn run_checked(&mut self, command: &ExternalCommand) -> Result<()> {
        let status = self.run(command)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::command_failed(command.to_string(), status.to_string()))
        }
    }
}

/// Runs commands as child processes of this one
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(&self, command: &ExternalCommand) -> Result<Command> {
        let program = which::which(command.program()).map_err(|_| Error::CommandNotFound {
            program: command.program().to_string(),
        })?;
        let mut cmd = Command::new(program);
        cmd.args(command.args());
        // Children share the terminal; earlier progress text must land first
        io::stdout().flush()?;
        Ok(cmd)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<CommandStatus> {
        info!("Running {}", command);
        let status = self.command(command)?.status()?;
        debug!("{} finished with {}", command, status);
        Ok(status.into())
    }

    fn capture(&mut self, command: &ExternalCommand) -> Result<CapturedOutput> {
        info!("Capturing {}", command);
        let output = self
            .command(command)?
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        let text = String::from_utf8_lossy(&output.stdout);
        debug!(
            "{} finished with {} ({} bytes)",
            command,
            output.status,
            output.stdout.len()
        );
        Ok(CapturedOutput {
            status: output.status.into(),
            output: RawOutput::from_text(&text),
        })
    }
}
