//! # Error Types — Process Execution
//!
//! Errors raised while launching external programs. A program that starts
//! and exits non-zero is not an error at this layer; it is reported as a
//! [`ProcessStatus`](crate::ProcessStatus) and judged by the caller.

use thiserror::Error;

/// Exit code reported when a program cannot be found on `PATH`, matching
/// the convention of POSIX shells.
pub const EXIT_COMMAND_NOT_FOUND: u8 = 127;

/// Error launching or talking to an external program.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The program could not be started at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        /// Program name as given to the runner.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Captured output was not valid UTF-8.
    #[error("`{program}` wrote non-UTF-8 output to {stream}")]
    NonUtf8Output {
        /// Program name as given to the runner.
        program: String,
        /// `stdout` or `stderr`.
        stream: &'static str,
    },
}

impl CoreError {
    /// Process exit code this error maps to.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_COMMAND_NOT_FOUND
            }
            _ => 1,
        }
    }
}
