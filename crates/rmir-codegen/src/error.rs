//! # Orchestrator Errors
//!
//! Every failure is fatal to the run. [`CodegenError::exit_code`] maps each
//! variant to the status the `rmir` binary exits with; compiler failures
//! pass the compiler's own exit code through.

use std::path::PathBuf;

use rmir_core::{CoreError, ProcessStatus};
use thiserror::Error;

/// Error raised while planning or running schema compilation.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// The configured source directory does not exist or is not a directory.
    #[error("schema source directory {path} does not exist or is not a directory")]
    MissingSourceDirectory { path: PathBuf },

    /// The source directory exists but could not be listed.
    #[error("failed to list schema directory {path}: {source}")]
    ReadSourceDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema file could not be read.
    #[error("failed to read schema {path}: {source}")]
    ReadSchema {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The `package` declaration is not a dotted identifier.
    #[error("schema {path} declares invalid package `{declared}`")]
    InvalidNamespace { path: PathBuf, declared: String },

    /// Two schemas would generate the same artifact.
    #[error("schemas {first} and {second} both generate {artifact}")]
    DuplicateArtifact {
        first: PathBuf,
        second: PathBuf,
        artifact: PathBuf,
    },

    /// The destination root could not be created.
    #[error("failed to create destination directory {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler could not be launched.
    #[error("failed to run compiler for {schema}: {source}")]
    CompilerLaunch {
        schema: PathBuf,
        #[source]
        source: CoreError,
    },

    /// The compiler exited non-zero.
    #[error("compiler failed for {schema} with {status}")]
    CompilerFailed {
        schema: PathBuf,
        status: ProcessStatus,
    },

    /// The compiler exited zero but an expected artifact is absent.
    #[error("compiler reported success for {schema} but did not write {artifact}")]
    MissingArtifact { schema: PathBuf, artifact: PathBuf },

    /// Collected failures from a collect-all run, in schema order.
    #[error("{} of {total} schemas failed to compile", failures.len())]
    Failures {
        total: usize,
        failures: Vec<CodegenError>,
    },
}

impl CodegenError {
    /// Process exit code for this error.
    ///
    /// Aggregated failures report the exit code of the first failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CodegenError::CompilerFailed { status, .. } => status.exit_code(),
            CodegenError::CompilerLaunch { source, .. } => source.exit_code(),
            CodegenError::Failures { failures, .. } => {
                failures.first().map_or(1, CodegenError::exit_code)
            }
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_failure_passes_status_through() {
        let err = CodegenError::CompilerFailed {
            schema: PathBuf::from("protos/note.proto"),
            status: ProcessStatus::from_code(3),
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "compiler failed for protos/note.proto with exit status 3"
        );
    }

    #[test]
    fn missing_compiler_is_127() {
        let err = CodegenError::CompilerLaunch {
            schema: PathBuf::from("note.proto"),
            source: CoreError::Spawn {
                program: "protoc".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        };
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn aggregated_failures_use_first_status() {
        let err = CodegenError::Failures {
            total: 5,
            failures: vec![
                CodegenError::CompilerFailed {
                    schema: PathBuf::from("a.proto"),
                    status: ProcessStatus::from_code(2),
                },
                CodegenError::CompilerFailed {
                    schema: PathBuf::from("b.proto"),
                    status: ProcessStatus::from_code(9),
                },
            ],
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "2 of 5 schemas failed to compile");
    }

    #[test]
    fn missing_source_directory_is_1() {
        let err = CodegenError::MissingSourceDirectory {
            path: PathBuf::from("protos"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("protos"));
    }
}
