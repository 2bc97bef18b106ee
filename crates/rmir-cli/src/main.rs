//! # rmir CLI entry point
//!
//! Parses command-line arguments, resolves the repository root and
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rmir_cli::protos::{run_protos, ProtosArgs};
use rmir_cli::toolchain::{run_toolchain, ToolchainArgs};
use rmir_cli::Workspace;

/// resolv-mir protobuf toolchain.
///
/// Compiles the repository's .proto schemas into Python modules and type
/// stubs, and installs the protobuf compiler they need.
#[derive(Parser, Debug)]
#[command(name = "rmir", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file. Defaults to `<repo root>/rmir.yaml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository root. Defaults to the nearest ancestor of the current
    /// directory containing `rmir.yaml` or `pyproject.toml`.
    #[arg(long, global = true)]
    repo_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and inspect .proto schemas.
    Protos(ProtosArgs),

    /// Install and inspect the protobuf compiler.
    Toolchain(ToolchainArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("rmir CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            Workspace::resolve(cli.repo_root.as_deref(), cli.config.as_deref(), &cwd)
        })
        .and_then(|workspace| match &cli.command {
            Commands::Protos(args) => run_protos(args, &workspace),
            Commands::Toolchain(args) => run_toolchain(args, &workspace),
        });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
