//! # Toolchain Subcommand
//!
//! Install and inspect the protobuf compiler.
//!
//! ## Usage
//!
//! ```bash
//! rmir toolchain install            # sudo apt-get install -y protobuf-compiler, or brew install protobuf
//! rmir toolchain install --dry-run  # print the command only
//! rmir toolchain check              # protoc --version
//! rmir toolchain detect             # kernel identifier and platform profile
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};

use rmir_core::{CommandRunner, SystemRunner};
use rmir_toolchain::{Installer, PlatformProfile, ToolchainError};

use crate::Workspace;

/// Toolchain subcommand arguments.
#[derive(Args, Debug)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommand,
}

/// Available toolchain subcommands.
#[derive(Subcommand, Debug)]
pub enum ToolchainCommand {
    /// Install the protobuf compiler with the host's package manager.
    Install {
        /// Print the install command without running it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the schema compiler runs and print its version.
    Check {
        /// Compiler command to check. Defaults to the configured compiler.
        #[arg(long)]
        compiler: Option<String>,
    },

    /// Print the detected kernel identifier and platform profile.
    Detect,
}

/// Execute the toolchain subcommand on the host.
pub fn run_toolchain(args: &ToolchainArgs, workspace: &Workspace) -> Result<u8> {
    run_toolchain_with(args, workspace, SystemRunner)
}

/// Execute the toolchain subcommand through `runner`.
pub fn run_toolchain_with<R: CommandRunner>(
    args: &ToolchainArgs,
    workspace: &Workspace,
    runner: R,
) -> Result<u8> {
    let installer = Installer::new(runner, workspace.config.toolchain.clone());
    let outcome = match &args.command {
        ToolchainCommand::Install { dry_run: true } => installer.plan().map(|command| {
            println!("{}", command.to_invocation().command_line());
        }),
        ToolchainCommand::Install { dry_run: false } => installer.install().map(|_| ()),
        ToolchainCommand::Check { compiler } => {
            let compiler = compiler
                .as_deref()
                .unwrap_or(&workspace.config.codegen.compiler);
            installer.check_compiler(compiler).map(|version| {
                println!("{compiler}: {version}");
            })
        }
        ToolchainCommand::Detect => run_detect(&installer),
    };
    Ok(match outcome {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    })
}

fn run_detect<R: CommandRunner>(installer: &Installer<R>) -> Result<(), ToolchainError> {
    let kernel = installer.kernel_identifier()?;
    let profile = PlatformProfile::classify(&kernel);
    println!("  kernel:   {kernel}");
    println!("  profile:  {profile}");
    if !profile.is_supported() {
        return Err(ToolchainError::UnsupportedPlatform { kernel });
    }
    Ok(())
}
