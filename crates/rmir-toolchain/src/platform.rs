//! # Platform Profiles
//!
//! The kernel identifier is classified by exact, case-sensitive prefix
//! match on its leading token. Every profile maps to an install command
//! through one exhaustive `match`, so a new profile cannot silently fall
//! through to another platform's package manager.

use std::fmt;

use rmir_core::{Invocation, ToolchainSection};

/// Host operating-system family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformProfile {
    Linux,
    Darwin,
    /// Any other kernel, carrying the identifier as reported.
    Unsupported(String),
}

impl PlatformProfile {
    /// Classify the output of `uname -s`.
    pub fn classify(kernel: &str) -> Self {
        let token = kernel.split_whitespace().next().unwrap_or("");
        if token.starts_with("Linux") {
            PlatformProfile::Linux
        } else if token.starts_with("Darwin") {
            PlatformProfile::Darwin
        } else {
            PlatformProfile::Unsupported(kernel.trim().to_string())
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PlatformProfile::Unsupported(_))
    }

    /// Command installing the compiler package, `None` when unsupported.
    pub fn install_command(&self, packages: &ToolchainSection) -> Option<InstallCommand> {
        match self {
            PlatformProfile::Linux => Some(InstallCommand {
                program: "apt-get".to_string(),
                args: vec![
                    "install".to_string(),
                    "-y".to_string(),
                    packages.linux_package.clone(),
                ],
                elevated: true,
            }),
            PlatformProfile::Darwin => Some(InstallCommand {
                program: "brew".to_string(),
                args: vec!["install".to_string(), packages.darwin_formula.clone()],
                elevated: false,
            }),
            PlatformProfile::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformProfile::Linux => f.write_str("linux"),
            PlatformProfile::Darwin => f.write_str("darwin"),
            PlatformProfile::Unsupported(kernel) => write!(f, "unsupported ({kernel})"),
        }
    }
}

/// A package-manager install command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Run through `sudo`.
    pub elevated: bool,
}

impl InstallCommand {
    pub fn to_invocation(&self) -> Invocation {
        if self.elevated {
            Invocation::new("sudo").arg(&self.program).args(&self.args)
        } else {
            Invocation::new(&self.program).args(&self.args)
        }
    }
}
