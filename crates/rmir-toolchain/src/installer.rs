//! # Installer
//!
//! Queries the kernel with `uname -s`, classifies it, and runs the install
//! command for the resulting [`PlatformProfile`]. Success is defined solely
//! by the package manager exiting zero.

use rmir_core::config::DEFAULT_COMPILER;
use rmir_core::{
    split_command_line, CommandRunner, Invocation, ProcessStatus, SystemRunner, ToolchainSection,
};

use crate::error::ToolchainError;
use crate::platform::{InstallCommand, PlatformProfile};

/// Installs the schema compiler through a [`CommandRunner`].
pub struct Installer<R> {
    runner: R,
    packages: ToolchainSection,
}

impl<R: CommandRunner> Installer<R> {
    pub fn new(runner: R, packages: ToolchainSection) -> Self {
        Self { runner, packages }
    }

    /// Kernel identifier as reported by `uname -s`, trimmed.
    pub fn kernel_identifier(&self) -> Result<String, ToolchainError> {
        let output = self
            .runner
            .capture(&Invocation::new("uname").arg("-s"))
            .map_err(ToolchainError::KernelQuery)?;
        if !output.status.success() {
            return Err(ToolchainError::KernelQueryFailed(output.status));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Profile of the host.
    pub fn detect(&self) -> Result<PlatformProfile, ToolchainError> {
        self.classify_host().map(|(_, profile)| profile)
    }

    /// Install command for the host, or `UnsupportedPlatform`.
    pub fn plan(&self) -> Result<InstallCommand, ToolchainError> {
        let (kernel, profile) = self.classify_host()?;
        profile
            .install_command(&self.packages)
            .ok_or(ToolchainError::UnsupportedPlatform { kernel })
    }

    fn classify_host(&self) -> Result<(String, PlatformProfile), ToolchainError> {
        let kernel = self.kernel_identifier()?;
        let profile = PlatformProfile::classify(&kernel);
        tracing::debug!(%kernel, %profile, "detected platform");
        Ok((kernel, profile))
    }

    /// Detect the platform and run its install command once.
    pub fn install(&self) -> Result<ProcessStatus, ToolchainError> {
        let command = self.plan()?;
        let invocation = command.to_invocation();
        let command_line = invocation.command_line();
        tracing::info!(
            command = %command_line,
            elevated = command.elevated,
            "installing schema compiler"
        );
        let status = self
            .runner
            .run(&invocation)
            .map_err(|source| ToolchainError::InstallLaunch {
                command: command_line.clone(),
                source,
            })?;
        if !status.success() {
            return Err(ToolchainError::InstallFailed {
                command: command_line,
                status,
            });
        }
        tracing::info!("schema compiler installed");
        Ok(status)
    }

    /// Run `<compiler> --version` and return the reported version line.
    ///
    /// `compiler` may be a multi-word command such as
    /// `python -m grpc_tools.protoc`.
    pub fn check_compiler(&self, compiler: &str) -> Result<String, ToolchainError> {
        let (program, leading_args) = split_command_line(compiler)
            .unwrap_or_else(|| (DEFAULT_COMPILER.to_string(), Vec::new()));
        let invocation = Invocation::new(program).args(leading_args).arg("--version");
        let output = self
            .runner
            .capture(&invocation)
            .map_err(|source| ToolchainError::CompilerUnavailable {
                compiler: compiler.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(ToolchainError::CompilerCheckFailed {
                compiler: compiler.to_string(),
                status: output.status,
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

/// Install the compiler on the host with default package names.
pub fn install() -> Result<ProcessStatus, ToolchainError> {
    Installer::new(SystemRunner, ToolchainSection::default()).install()
}

#[cfg(test)]
mod tests {
    use rmir_core::process::testing::ScriptedRunner;
    use rmir_core::CapturedOutput;

    use super::*;

    /// Answers `uname -s` with `kernel` and every other command with `status`.
    fn host(kernel: &'static str, status: ProcessStatus) -> ScriptedRunner {
        ScriptedRunner::new(move |inv| {
            if inv.program() == "uname" {
                Ok(CapturedOutput::success(format!("{kernel}\n")))
            } else {
                Ok(CapturedOutput::with_status(status))
            }
        })
    }

    fn installer(runner: &ScriptedRunner) -> Installer<&ScriptedRunner> {
        Installer::new(runner, ToolchainSection::default())
    }

    fn install_calls(runner: &ScriptedRunner) -> Vec<String> {
        runner
            .calls()
            .iter()
            .filter(|c| c.program() != "uname")
            .map(Invocation::command_line)
            .collect()
    }

    #[test]
    fn linux_runs_apt_get_once_with_sudo() {
        let runner = host("Linux", ProcessStatus::SUCCESS);
        let status = installer(&runner).install().unwrap();
        assert!(status.success());
        assert_eq!(
            install_calls(&runner),
            vec!["sudo apt-get install -y protobuf-compiler"]
        );
    }

    #[test]
    fn darwin_runs_brew_once_without_sudo() {
        let runner = host("Darwin", ProcessStatus::SUCCESS);
        installer(&runner).install().unwrap();
        let calls = install_calls(&runner);
        assert_eq!(calls, vec!["brew install protobuf"]);
        assert!(!calls[0].contains("sudo"));
    }

    #[test]
    fn unsupported_kernel_names_it_and_runs_nothing() {
        let runner = host("FreeBSD", ProcessStatus::SUCCESS);
        let err = installer(&runner).install().unwrap_err();
        match &err {
            ToolchainError::UnsupportedPlatform { kernel } => assert_eq!(kernel, "FreeBSD"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("FreeBSD"));
        assert_ne!(err.exit_code(), 0);
        assert!(install_calls(&runner).is_empty());
    }

    #[test]
    fn package_manager_status_is_propagated() {
        let runner = host("Linux", ProcessStatus::from_code(100));
        let err = installer(&runner).install().unwrap_err();
        assert!(matches!(err, ToolchainError::InstallFailed { .. }));
        assert_eq!(err.exit_code(), 100);
        assert_eq!(install_calls(&runner).len(), 1, "no retry");
    }

    #[test]
    fn reinstall_is_delegated_to_package_manager() {
        let runner = host("Darwin", ProcessStatus::SUCCESS);
        let installer = installer(&runner);
        installer.install().unwrap();
        installer.install().unwrap();
        assert_eq!(install_calls(&runner).len(), 2);
    }

    #[test]
    fn failing_uname_is_reported() {
        let runner = ScriptedRunner::with_status(ProcessStatus::from_code(2));
        let err = installer(&runner).install().unwrap_err();
        assert!(matches!(err, ToolchainError::KernelQueryFailed(_)));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn missing_uname_is_reported() {
        let runner = ScriptedRunner::not_found();
        let err = installer(&runner).detect().unwrap_err();
        assert!(matches!(err, ToolchainError::KernelQuery(_)));
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn plan_does_not_install() {
        let runner = host("Linux", ProcessStatus::SUCCESS);
        let command = installer(&runner).plan().unwrap();
        assert!(command.elevated);
        assert!(install_calls(&runner).is_empty());
    }

    #[test]
    fn check_compiler_returns_version() {
        let runner = ScriptedRunner::new(|_| Ok(CapturedOutput::success("libprotoc 25.1\n")));
        let version = installer(&runner).check_compiler("protoc").unwrap();
        assert_eq!(version, "libprotoc 25.1");
        assert_eq!(runner.calls()[0].command_line(), "protoc --version");
    }

    #[test]
    fn check_compiler_splits_multi_word_commands() {
        let runner = ScriptedRunner::new(|_| Ok(CapturedOutput::success("libprotoc 3.20.3")));
        installer(&runner)
            .check_compiler("python -m grpc_tools.protoc")
            .unwrap();
        assert_eq!(
            runner.calls()[0].command_line(),
            "python -m grpc_tools.protoc --version"
        );
    }

    #[test]
    fn check_compiler_blank_command_uses_default() {
        let runner = ScriptedRunner::new(|_| Ok(CapturedOutput::success("libprotoc 25.1")));
        installer(&runner).check_compiler("   ").unwrap();
        assert_eq!(runner.calls()[0].command_line(), "protoc --version");
    }

    #[test]
    fn check_compiler_reports_missing_binary() {
        let runner = ScriptedRunner::not_found();
        let err = installer(&runner).check_compiler("protoc").unwrap_err();
        assert!(matches!(err, ToolchainError::CompilerUnavailable { .. }));
        assert_eq!(err.exit_code(), 127);
    }
}
