//! # Protos Subcommand
//!
//! Compile schema files into generated Python bindings.
//!
//! ## Usage
//!
//! ```bash
//! # Compile protos/*.proto into src/ (or as configured in rmir.yaml):
//! rmir protos compile
//!
//! # Keep going after a failing schema and report every failure:
//! rmir protos compile --policy collect-all
//!
//! # Print the compiler command lines without running them:
//! rmir protos compile --dry-run
//!
//! # Show the planned artifacts, optionally as JSON:
//! rmir protos list --json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use rmir_codegen::{CodegenConfig, CodegenError, CompilerCommand, FailurePolicy, Orchestrator};
use rmir_core::SystemRunner;

use crate::Workspace;

/// Protos subcommand arguments.
#[derive(Args, Debug)]
pub struct ProtosArgs {
    #[command(subcommand)]
    pub command: ProtosCommand,
}

/// Available protos subcommands.
#[derive(Subcommand, Debug)]
pub enum ProtosCommand {
    /// Compile every schema in the source directory.
    Compile(CompileArgs),

    /// List the schemas and the artifacts each would generate.
    List {
        #[command(flatten)]
        paths: PathOverrides,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

/// Overrides for the `codegen:` section of `rmir.yaml`.
#[derive(Args, Debug, Default)]
pub struct PathOverrides {
    /// Directory containing `*.proto` files, relative to the repository root.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Root of the generated tree, relative to the repository root.
    #[arg(long)]
    pub destination_dir: Option<PathBuf>,

    /// Schema compiler command (e.g. `protoc`, `python -m grpc_tools.protoc`).
    #[arg(long)]
    pub compiler: Option<String>,
}

/// Arguments for `rmir protos compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub paths: PathOverrides,

    /// What to do when a schema fails to compile.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Print the compiler command lines without running them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Command-line spelling of [`FailurePolicy`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Stop at the first failing schema.
    FailFast,
    /// Compile every schema, then report all failures.
    CollectAll,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => FailurePolicy::FailFast,
            PolicyArg::CollectAll => FailurePolicy::CollectAll,
        }
    }
}

/// Execute the protos subcommand.
pub fn run_protos(args: &ProtosArgs, workspace: &Workspace) -> Result<u8> {
    match &args.command {
        ProtosCommand::Compile(compile) => run_compile(compile, workspace),
        ProtosCommand::List { paths, json } => run_list(paths, *json, workspace),
    }
}

/// Orchestrator inputs from configuration plus command-line overrides.
pub fn codegen_config(
    workspace: &Workspace,
    paths: &PathOverrides,
    policy: Option<PolicyArg>,
) -> Result<CodegenConfig> {
    let repo_root = workspace
        .repo_root()
        .context("schema compilation needs the repository root; pass --repo-root")?;
    let mut config = CodegenConfig::from_section(repo_root, &workspace.config.codegen);
    if let Some(dir) = &paths.source_dir {
        config.source_dir = dir.clone();
    }
    if let Some(dir) = &paths.destination_dir {
        config.destination_dir = dir.clone();
    }
    if let Some(compiler) = &paths.compiler {
        config.compiler = CompilerCommand::from_command_line(compiler);
    }
    if let Some(policy) = policy {
        config.failure_policy = policy.into();
    }
    Ok(config)
}

fn run_compile(args: &CompileArgs, workspace: &Workspace) -> Result<u8> {
    let config = codegen_config(workspace, &args.paths, args.policy)?;
    let orchestrator = Orchestrator::new(config, SystemRunner);

    if args.dry_run {
        return Ok(match orchestrator.dry_run() {
            Ok(invocations) => {
                for invocation in &invocations {
                    println!("{}", invocation.command_line());
                }
                0
            }
            Err(e) => report_failure(&e),
        });
    }

    Ok(match orchestrator.compile_all() {
        Ok(report) => {
            println!(
                "Compiled {} schema(s) into {} artifact(s)",
                report.compiled.len(),
                report.artifact_count()
            );
            0
        }
        Err(e) => report_failure(&e),
    })
}

fn run_list(paths: &PathOverrides, json: bool, workspace: &Workspace) -> Result<u8> {
    let config = codegen_config(workspace, paths, None)?;
    let jobs = match Orchestrator::new(config, SystemRunner).plan() {
        Ok(jobs) => jobs,
        Err(e) => return Ok(report_failure(&e)),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&jobs).context("failed to serialise job list")?
        );
        return Ok(0);
    }

    for job in &jobs {
        let namespace = job.schema.namespace().to_string();
        println!(
            "  {:<32} {}",
            job.schema.path().display(),
            if namespace.is_empty() { "(root)" } else { namespace.as_str() }
        );
        for artifact in &job.artifacts {
            println!("      -> {}", artifact.path.display());
        }
    }
    println!();
    println!("Total: {} schemas", jobs.len());
    Ok(0)
}

/// Log `err` (and each collected failure) and return its exit code.
fn report_failure(err: &CodegenError) -> u8 {
    if let CodegenError::Failures { failures, .. } = err {
        for failure in failures {
            tracing::error!("{failure}");
        }
    }
    tracing::error!("{err}");
    err.exit_code()
}
