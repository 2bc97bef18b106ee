//! # rmir-codegen — Schema Compiler Orchestrator
//!
//! Compiles every `*.proto` file in a source directory into generated
//! Python bindings for the `resolv_mir` package.
//!
//! ## Pipeline
//!
//! 1. [`discover`] lists `*.proto` files directly inside the source
//!    directory, sorted by file name.
//! 2. [`schema`] reads each file's `package` declaration into a
//!    [`Namespace`].
//! 3. [`Orchestrator::plan`] turns each schema into a [`CompileJob`] with
//!    exactly two expected [`Artifact`]s under
//!    `destination/<namespace path>/`.
//! 4. [`Orchestrator::compile_iter`] lazily runs the compiler once per job;
//!    [`Orchestrator::compile_all`] aggregates the results according to the
//!    configured [`FailurePolicy`].
//!
//! ## Crate Policy
//!
//! - No caching: every run regenerates and overwrites both artifacts.
//! - Execution is sequential. The next schema is not started until the
//!   compiler has exited for the current one.
//! - A compiler failure is surfaced with its exit status unchanged.

pub mod artifact;
pub mod compiler;
pub mod discover;
pub mod error;
pub mod orchestrator;
pub mod schema;

pub use artifact::{Artifact, ArtifactKind};
pub use compiler::CompilerCommand;
pub use discover::{discover_schemas, SCHEMA_EXTENSION};
pub use error::CodegenError;
pub use orchestrator::{
    compile_all, CodegenConfig, CompileJob, CompileReport, CompiledSchema, Orchestrator,
};
pub use rmir_core::FailurePolicy;
pub use schema::{Namespace, SchemaFile};
