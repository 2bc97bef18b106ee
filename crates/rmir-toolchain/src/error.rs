//! Installer error types.

use rmir_core::{CoreError, ProcessStatus};
use thiserror::Error;

/// Error raised while detecting the platform or installing the compiler.
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// `uname` could not be run.
    #[error("failed to query kernel identifier: {0}")]
    KernelQuery(#[source] CoreError),

    /// `uname` ran but failed.
    #[error("kernel query `uname -s` failed with {0}")]
    KernelQueryFailed(ProcessStatus),

    /// The kernel is neither Linux nor Darwin.
    #[error("unsupported platform: unrecognized kernel `{kernel}` (supported: Linux, Darwin)")]
    UnsupportedPlatform { kernel: String },

    /// The package manager could not be launched.
    #[error("failed to run `{command}`: {source}")]
    InstallLaunch {
        command: String,
        #[source]
        source: CoreError,
    },

    /// The package manager exited non-zero.
    #[error("`{command}` failed with {status}")]
    InstallFailed {
        command: String,
        status: ProcessStatus,
    },

    /// The compiler is not on `PATH`.
    #[error("schema compiler `{compiler}` is not available: {source}")]
    CompilerUnavailable {
        compiler: String,
        #[source]
        source: CoreError,
    },

    /// `<compiler> --version` exited non-zero.
    #[error("`{compiler} --version` failed with {status}")]
    CompilerCheckFailed {
        compiler: String,
        status: ProcessStatus,
    },
}

impl ToolchainError {
    /// Process exit code; package-manager failures pass their status through.
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolchainError::InstallFailed { status, .. }
            | ToolchainError::CompilerCheckFailed { status, .. } => status.exit_code(),
            ToolchainError::InstallLaunch { source, .. }
            | ToolchainError::CompilerUnavailable { source, .. } => source.exit_code(),
            ToolchainError::KernelQuery(source) => source.exit_code(),
            ToolchainError::KernelQueryFailed(_) | ToolchainError::UnsupportedPlatform { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_names_kernel() {
        let err = ToolchainError::UnsupportedPlatform {
            kernel: "FreeBSD".into(),
        };
        assert!(err.to_string().contains("`FreeBSD`"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn install_failure_passes_status_through() {
        let err = ToolchainError::InstallFailed {
            command: "brew install protobuf".into(),
            status: ProcessStatus::from_code(100),
        };
        assert_eq!(err.exit_code(), 100);
        assert_eq!(
            err.to_string(),
            "`brew install protobuf` failed with exit status 100"
        );
    }

    #[test]
    fn missing_package_manager_is_127() {
        let err = ToolchainError::InstallLaunch {
            command: "brew install protobuf".into(),
            source: CoreError::Spawn {
                program: "brew".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        };
        assert_eq!(err.exit_code(), 127);
    }
}
