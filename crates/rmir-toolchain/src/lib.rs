//! # rmir-toolchain — Schema Compiler Installer
//!
//! Provisions `protoc` on a developer machine.
//!
//! - [`platform`] classifies the kernel identifier reported by `uname -s`
//!   into a closed [`PlatformProfile`] and maps each profile to its
//!   [`InstallCommand`].
//! - [`installer`] queries the kernel, runs the selected command, and
//!   reports its exit status. It can also check whether the compiler is
//!   already available.
//!
//! ## Crate Policy
//!
//! - An unsupported kernel never runs anything beyond the kernel query.
//! - Idempotence is left to the package manager: installing an already
//!   installed package is simply re-run.
//! - No retries.

pub mod error;
pub mod installer;
pub mod platform;

pub use error::ToolchainError;
pub use installer::{install, Installer};
pub use platform::{InstallCommand, PlatformProfile};
