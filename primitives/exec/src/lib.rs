#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `rpcgen-exec`: External Command Layer
//!
//! This crate defines the **command runner abstraction** used by the
//! scaffolding pipeline whenever it has to hand work to an external
//! toolchain (`go mod init`, `protoc`, `make`, ...).
//!
//! ## Core Concepts
//!
//! ### `CommandRunner` Trait
//! Runs one command string inside a working directory and returns the
//! captured standard output, or an [`ExecError`] carrying whatever the
//! process printed. Runs block until the child exits; there is no timeout.
//!
//! ### `ShellRunner`
//! The production runner. Commands go through the platform shell
//! (`sh -c` on unix, `cmd /C` on windows) so that command strings such as
//! `protoc greeter.proto --go_out=.` behave exactly as typed.
//!
//! ### `RecordingRunner`
//! An in-memory runner that records every invocation in order and can be
//! scripted to fail, so callers can assert on the command sequence without
//! executing anything.
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use exec::{CommandRunner, ShellRunner};
//!
//! let output = ShellRunner.run("go version", Path::new(".")).expect("go is installed");
//! println!("{}", output.trim());
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::{Arc, Mutex, PoisonError};

/// Type alias for structured error handling in command execution.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Error type for command execution.
#[derive(thiserror::Error, Debug)]
pub enum ExecError {
    /// The shell could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Command string that was requested
        command: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully.
    #[error("`{command}` failed in {} ({status}): {output}", dir.display())]
    Failed {
        /// Command string that was run
        command: String,
        /// Working directory of the run
        dir: PathBuf,
        /// Exit status description (e.g. "exit status: 1")
        status: String,
        /// Captured stderr, or stdout when stderr was empty
        output: String,
    },
}

/// Capability for running external commands.
///
/// Implementations must run `command` with `dir` as the working directory and
/// only return `Ok` when the command exited successfully.
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `dir`, returning the captured standard output.
    fn run(&self, command: &str, dir: &Path) -> Result<String>;
}

/// Type alias for a shared, dynamically dispatched runner.
pub type DynRunner = Arc<dyn CommandRunner>;

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, command: &str, dir: &Path) -> Result<String> { (**self).run(command, dir) }
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<String> {
        tracing::debug!(command, dir = %dir.display(), "running external command");

        let output = Self::shell_command(command)
            .current_dir(dir)
            .output()
            .map_err(|source| ExecError::Spawn { command: command.to_string(), source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let captured = if stderr.trim().is_empty() { stdout } else { stderr };
        Err(ExecError::Failed {
            command: command.to_string(),
            dir: dir.to_path_buf(),
            status: describe_status(output.status),
            output: captured.trim_end().to_string(),
        })
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status: {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Command string
    pub command: String,
    /// Working directory
    pub dir: PathBuf,
}

/// A runner that records invocations instead of executing them.
///
/// Every call is recorded, including scripted failures. A command fails when
/// it starts with one of the prefixes registered through [`RecordingRunner::fail_on`].
#[derive(Debug, Default)]
pub struct RecordingRunner {
    invocations: Mutex<Vec<Invocation>>,
    failing_prefixes: Vec<String>,
    stdout: String,
}

impl RecordingRunner {
    /// Create a runner where every command succeeds with empty output
    pub fn new() -> Self { Self::default() }

    /// Make every command starting with `prefix` fail
    pub fn fail_on(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.push(prefix.into());
        self
    }

    /// Set the stdout returned by successful commands
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Snapshot of recorded invocations, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recorded command strings, in call order
    pub fn commands(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.command).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &str, dir: &Path) -> Result<String> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Invocation { command: command.to_string(), dir: dir.to_path_buf() });

        if self.failing_prefixes.iter().any(|p| command.starts_with(p.as_str())) {
            return Err(ExecError::Failed {
                command: command.to_string(),
                dir: dir.to_path_buf(),
                status: "exit status: 1".to_string(),
                output: format!("scripted failure for `{}`", command),
            });
        }
        Ok(self.stdout.clone())
    }
}
