//! # rmir-cli — Command-Line Interface for the resolv-mir Protobuf Toolchain
//!
//! Provides the `rmir` binary. Both everyday operations take no arguments;
//! every path defaults to the repository layout or `rmir.yaml`:
//!
//! ```bash
//! rmir toolchain install      # apt-get / brew install the protobuf compiler
//! rmir protos compile         # protos/*.proto -> src/<package path>/*_pb2.py{,i}
//! ```
//!
//! ## Subcommands
//!
//! - `rmir protos compile` — Compile every schema (`--dry-run`, `--policy`).
//! - `rmir protos list` — Show planned jobs without running the compiler.
//! - `rmir toolchain install` — Install the compiler for the host platform.
//! - `rmir toolchain check` — Report the installed compiler version.
//! - `rmir toolchain detect` — Show the detected kernel and profile.
//!
//! ## Exit Codes
//!
//! Handlers return the process exit code. Failures of external programs
//! pass their exit code through; a missing program exits 127.

pub mod protos;
pub mod toolchain;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rmir_core::{find_repo_root, Config, ConfigError};

/// Repository root and configuration shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Workspace {
    repo_root: Option<PathBuf>,
    search_start: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Resolve the repository root and load configuration.
    ///
    /// An explicit `repo_root` must exist. Otherwise the root is searched
    /// upward from `cwd`; not finding one is only an error for commands
    /// that need it (see [`Workspace::repo_root`]). An explicit `config`
    /// file replaces `<root>/rmir.yaml`.
    pub fn resolve(repo_root: Option<&Path>, config: Option<&Path>, cwd: &Path) -> Result<Self> {
        let repo_root = match repo_root {
            Some(path) => Some(
                std::fs::canonicalize(cwd.join(path))
                    .with_context(|| format!("repository root {} not found", path.display()))?,
            ),
            None => find_repo_root(cwd).ok(),
        };
        let config = match (config, &repo_root) {
            (Some(path), _) => Config::load(&cwd.join(path))?,
            (None, Some(root)) => Config::load_from_root(root)?,
            (None, None) => Config::default(),
        };
        if let Some(root) = &repo_root {
            tracing::debug!(repo_root = %root.display(), "resolved repository root");
        }
        Ok(Self {
            repo_root,
            search_start: cwd.to_path_buf(),
            config,
        })
    }

    /// Repository root, required by schema compilation.
    pub fn repo_root(&self) -> Result<&Path, ConfigError> {
        self.repo_root
            .as_deref()
            .ok_or_else(|| ConfigError::RepoRootNotFound {
                start: self.search_start.clone(),
            })
    }
}
