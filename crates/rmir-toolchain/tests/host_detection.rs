//! Integration test: classify the machine the tests run on.

use rmir_core::process::testing::ScriptedRunner;
use rmir_core::{CapturedOutput, SystemRunner, ToolchainSection};
use rmir_toolchain::{Installer, PlatformProfile, ToolchainError};

#[cfg(target_os = "linux")]
#[test]
fn linux_host_is_detected() {
    let installer = Installer::new(SystemRunner, ToolchainSection::default());
    assert_eq!(installer.detect().unwrap(), PlatformProfile::Linux);
    assert!(installer.plan().unwrap().elevated);
}

#[cfg(target_os = "macos")]
#[test]
fn macos_host_is_detected() {
    let installer = Installer::new(SystemRunner, ToolchainSection::default());
    assert_eq!(installer.detect().unwrap(), PlatformProfile::Darwin);
    assert!(!installer.plan().unwrap().elevated);
}

#[test]
fn unsupported_kernel_never_reaches_a_package_manager() {
    for kernel in ["FreeBSD", "OpenBSD", "SunOS", "CYGWIN_NT-10.0", "linux"] {
        let runner = ScriptedRunner::new(move |_| Ok(CapturedOutput::success(kernel)));
        let err = Installer::new(&runner, ToolchainSection::default())
            .install()
            .unwrap_err();
        assert!(
            matches!(&err, ToolchainError::UnsupportedPlatform { kernel: k } if k == kernel),
            "{kernel}: {err}"
        );
        let calls = runner.calls();
        assert_eq!(calls.len(), 1, "{kernel}: only the kernel query may run");
        assert_eq!(calls[0].command_line(), "uname -s");
    }
}
