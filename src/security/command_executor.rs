//! SafeCommandExecutor: whitelisted command execution for working-copy inspection
//!
//! Arguments are passed as a vector to `std::process::Command`, never through
//! a shell, and only whitelisted binaries may run.
//!
//! # Example
//!
//! ```rust,no_run
//! use plasma_publish::SafeCommandExecutor;
//!
//! let executor = SafeCommandExecutor::new(".").unwrap();
//! let hash = executor.stdout("git", &["rev-parse", "--short", "HEAD"]).unwrap();
//! println!("{}", hash);
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

/// Allowed commands whitelist
const ALLOWED_COMMANDS: &[&str] = &["git"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command ran and exited unsuccessfully
    #[error("'{command}' exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Safe command executor bound to a working directory
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    working_dir: PathBuf,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.exists() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self { working_dir })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Execute a whitelisted command and return its raw output
    pub fn execute(&self, command: &str, args: &[&str]) -> Result<Output, CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        tracing::debug!(command, ?args, dir = %self.working_dir.display(), "executing command");

        Command::new(command)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }

    /// Execute a command and return its trimmed stdout, failing on non-zero exit
    pub fn stdout(&self, command: &str, args: &[&str]) -> Result<String, CommandError> {
        let output = self.execute(command, args)?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: format!("{} {}", command, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
