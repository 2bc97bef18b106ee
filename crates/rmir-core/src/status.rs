//! # Process Status
//!
//! A platform-neutral exit status. `std::process::ExitStatus` cannot be
//! constructed portably, which makes it unusable for scripted test runners,
//! so statuses are converted into [`ProcessStatus`] at the runner boundary.

use std::fmt;

/// Exit status of an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessStatus {
    code: Option<i32>,
}

impl ProcessStatus {
    /// Status of a program that exited with code 0.
    pub const SUCCESS: ProcessStatus = ProcessStatus { code: Some(0) };

    /// Status for a program that exited normally with `code`.
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Status for a program terminated without an exit code (e.g. a signal).
    pub fn terminated() -> Self {
        Self { code: None }
    }

    /// Success is defined solely by the exit code being zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to hand back to our own caller.
    ///
    /// Codes in `1..=255` pass through unchanged. Anything that does not fit
    /// a process exit code, and termination without a code, becomes `1` so
    /// that a failure can never be reported as success.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            Some(0) => 0,
            Some(code) => u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1),
            None => 1,
        }
    }
}

impl From<std::process::ExitStatus> for ProcessStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("terminated without exit status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_only_for_zero() {
        assert!(ProcessStatus::SUCCESS.success());
        assert!(ProcessStatus::from_code(0).success());
        assert!(!ProcessStatus::from_code(1).success());
        assert!(!ProcessStatus::terminated().success());
    }

    #[test]
    fn exit_code_passes_through_small_codes() {
        assert_eq!(ProcessStatus::from_code(0).exit_code(), 0);
        assert_eq!(ProcessStatus::from_code(3).exit_code(), 3);
        assert_eq!(ProcessStatus::from_code(255).exit_code(), 255);
    }

    #[test]
    fn exit_code_never_reports_failure_as_zero() {
        assert_eq!(ProcessStatus::from_code(256).exit_code(), 1);
        assert_eq!(ProcessStatus::from_code(-1).exit_code(), 1);
        assert_eq!(ProcessStatus::terminated().exit_code(), 1);
    }

    #[test]
    fn display() {
        assert_eq!(ProcessStatus::from_code(2).to_string(), "exit status 2");
        assert_eq!(
            ProcessStatus::terminated().to_string(),
            "terminated without exit status"
        );
    }
}
