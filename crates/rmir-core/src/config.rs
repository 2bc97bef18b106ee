//! # Configuration — `rmir.yaml`
//!
//! Optional configuration file at the repository root. Every field has a
//! default equal to the fixed layout of the resolv-mir repository, so an
//! absent file (or an empty one) yields the reference behaviour:
//!
//! ```yaml
//! codegen:
//!   source_dir: protos
//!   destination_dir: src
//!   compiler: protoc
//!   failure_policy: fail-fast
//! toolchain:
//!   linux_package: protobuf-compiler
//!   darwin_formula: protobuf
//! ```
//!
//! Relative paths are interpreted against the repository root, never the
//! caller's working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the configuration file, also a repository root marker.
pub const CONFIG_FILE_NAME: &str = "rmir.yaml";

/// Files whose presence marks a directory as the repository root.
const ROOT_MARKERS: &[&str] = &[CONFIG_FILE_NAME, "pyproject.toml"];

pub const DEFAULT_SOURCE_DIR: &str = "protos";
pub const DEFAULT_DESTINATION_DIR: &str = "src";
pub const DEFAULT_COMPILER: &str = "protoc";
pub const DEFAULT_LINUX_PACKAGE: &str = "protobuf-compiler";
pub const DEFAULT_DARWIN_FORMULA: &str = "protobuf";

/// Error loading configuration or locating the repository root.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`Config`].
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No ancestor of the start directory carries a root marker.
    #[error("could not locate repository root from {start}: no ancestor contains rmir.yaml or pyproject.toml")]
    RepoRootNotFound { start: PathBuf },
}

/// How the orchestrator aggregates per-schema compiler failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failing schema and surface its status.
    #[default]
    FailFast,
    /// Compile every schema, then report all failures together.
    CollectAll,
}

/// Top-level `rmir.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub codegen: CodegenSection,
    pub toolchain: ToolchainSection,
}

/// `codegen:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenSection {
    /// Directory holding `*.proto` files.
    pub source_dir: PathBuf,
    /// Root of the generated tree.
    pub destination_dir: PathBuf,
    /// Schema compiler executable.
    pub compiler: String,
    pub failure_policy: FailurePolicy,
}

impl Default for CodegenSection {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            destination_dir: PathBuf::from(DEFAULT_DESTINATION_DIR),
            compiler: DEFAULT_COMPILER.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// `toolchain:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSection {
    /// Debian/Ubuntu package providing the compiler.
    pub linux_package: String,
    /// Homebrew formula providing the compiler.
    pub darwin_formula: String,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            linux_package: DEFAULT_LINUX_PACKAGE.to_string(),
            darwin_formula: DEFAULT_DARWIN_FORMULA.to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `rmir.yaml` from `repo_root`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from_root(repo_root: &Path) -> Result<Self, ConfigError> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no configuration file; using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty document deserialises as unit, not as an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Walk up from `start` to the first directory containing a root marker.
pub fn find_repo_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut dir = Some(start);
    while let Some(candidate) = dir {
        if ROOT_MARKERS.iter().any(|m| candidate.join(m).is_file()) {
            return Ok(candidate.to_path_buf());
        }
        dir = candidate.parent();
    }
    Err(ConfigError::RepoRootNotFound {
        start: start.to_path_buf(),
    })
}
