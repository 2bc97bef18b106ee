//! # rmir-core — Shared Plumbing for the resolv-mir Protobuf Toolchain
//!
//! Foundational types used by both the schema compiler orchestrator
//! (`rmir-codegen`) and the toolchain installer (`rmir-toolchain`).
//!
//! ## Modules
//!
//! - [`error`] — Structured error hierarchy for process execution.
//! - [`status`] — [`ProcessStatus`], the exit status of an external command.
//! - [`process`] — [`Invocation`] and the [`CommandRunner`] execution seam.
//! - [`config`] — `rmir.yaml` loading and repository root discovery.
//!
//! ## Crate Policy
//!
//! - Every external program is launched through [`CommandRunner`], never
//!   through `std::process::Command` directly, so callers can substitute a
//!   scripted runner in tests.
//! - Nothing in this crate changes the process working directory. Paths are
//!   anchored explicitly on the repository root.

pub mod config;
pub mod error;
pub mod process;
pub mod status;

pub use config::{
    find_repo_root, CodegenSection, Config, ConfigError, FailurePolicy, ToolchainSection,
    CONFIG_FILE_NAME,
};
pub use error::CoreError;
pub use process::{split_command_line, CapturedOutput, CommandRunner, Invocation, SystemRunner};
pub use status::ProcessStatus;
