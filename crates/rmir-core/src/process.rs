//! # External Process Execution
//!
//! [`Invocation`] describes a single external command (program, arguments,
//! working directory). [`CommandRunner`] executes it synchronously; the
//! caller blocks until the program exits. There is no timeout: a hung
//! program blocks the whole run.
//!
//! [`SystemRunner`] is the production implementation. Tests substitute
//! [`testing::ScriptedRunner`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::CoreError;
use crate::status::ProcessStatus;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Start an invocation of `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the program from `dir` instead of the caller's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Program name as a lossy string, for diagnostics.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Space-joined command line, for logs and dry runs. Not shell-quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Split a whitespace-separated command line into the program and its
/// leading arguments. `None` for a blank line. Quotes are not interpreted.
pub fn split_command_line(command: &str) -> Option<(String, Vec<String>)> {
    let mut words = command.split_whitespace().map(str::to_string);
    let program = words.next()?;
    Some((program, words.collect()))
}

/// Output of a program run with captured stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    /// Successful output carrying `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: ProcessStatus::SUCCESS,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output with the given status and no text.
    pub fn with_status(status: ProcessStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Executes external programs synchronously.
pub trait CommandRunner {
    /// Run with inherited stdio and wait for the exit status.
    fn run(&self, invocation: &Invocation) -> Result<ProcessStatus, CoreError>;

    /// Run with captured stdout/stderr and wait for completion.
    fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, CoreError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ProcessStatus, CoreError> {
        (**self).run(invocation)
    }

    fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, CoreError> {
        (**self).capture(invocation)
    }
}

/// Runs programs on the host via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessStatus, CoreError> {
        tracing::debug!(command = %invocation.command_line(), "running");
        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|source| CoreError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
        let status = ProcessStatus::from(status);
        tracing::debug!(%status, program = %invocation.program_name(), "finished");
        Ok(status)
    }

    fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, CoreError> {
        tracing::debug!(command = %invocation.command_line(), "capturing");
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CoreError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
        let decode = |bytes: Vec<u8>, stream: &'static str| {
            String::from_utf8(bytes).map_err(|_| CoreError::NonUtf8Output {
                program: invocation.program_name(),
                stream,
            })
        };
        Ok(CapturedOutput {
            status: output.status.into(),
            stdout: decode(output.stdout, "stdout")?,
            stderr: decode(output.stderr, "stderr")?,
        })
    }
}

/// Scripted runner for tests in this and downstream crates.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::cell::RefCell;

    use super::*;

    type Handler = Box<dyn Fn(&Invocation) -> Result<CapturedOutput, CoreError>>;

    /// Records every invocation and answers it with a caller-supplied handler.
    pub struct ScriptedRunner {
        calls: RefCell<Vec<Invocation>>,
        handler: Handler,
    }

    impl ScriptedRunner {
        pub fn new(
            handler: impl Fn(&Invocation) -> Result<CapturedOutput, CoreError> + 'static,
        ) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                handler: Box::new(handler),
            }
        }

        /// Every invocation exits 0 with empty output.
        pub fn succeeding() -> Self {
            Self::new(|_| Ok(CapturedOutput::success("")))
        }

        /// Every invocation exits with `status`.
        pub fn with_status(status: ProcessStatus) -> Self {
            Self::new(move |_| Ok(CapturedOutput::with_status(status)))
        }

        /// Every invocation fails to launch as if the program were missing.
        pub fn not_found() -> Self {
            Self::new(|inv| {
                Err(CoreError::Spawn {
                    program: inv.program_name(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            })
        }

        /// Invocations seen so far, in order.
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }

        fn answer(&self, invocation: &Invocation) -> Result<CapturedOutput, CoreError> {
            self.calls.borrow_mut().push(invocation.clone());
            (self.handler)(invocation)
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> Result<ProcessStatus, CoreError> {
            self.answer(invocation).map(|out| out.status)
        }

        fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, CoreError> {
            self.answer(invocation)
        }
    }
}
