//! # Compiler Command Line
//!
//! Builds the protoc invocation for one schema. protoc places generated
//! files according to the path it resolved the input through, not the
//! `package` statement, so each schema is addressed through a virtual
//! include mapping that prefixes its namespace path:
//!
//! ```text
//! protoc --proto_path=music/note=protos --proto_path=protos \
//!        --python_out=out --pyi_out=out music/note/note.proto
//! ```
//!
//! The second `--proto_path` lets a schema import its siblings by bare
//! file name. Paths are passed exactly as configured and the compiler runs
//! from the repository root.
//!
//! The compiler may be a multi-word command such as
//! `python -m grpc_tools.protoc`; the leading words are passed before the
//! generated arguments.

use std::ffi::OsString;
use std::path::Path;

use rmir_core::{split_command_line, Invocation};

use crate::artifact::ArtifactKind;
use crate::schema::SchemaFile;

/// The external schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    program: String,
    leading_args: Vec<String>,
}

impl CompilerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Split a whitespace-separated command. A blank command is the default
    /// compiler.
    pub fn from_command_line(command: &str) -> Self {
        match split_command_line(command) {
            Some((program, leading_args)) => Self {
                program,
                leading_args,
            },
            None => Self::default(),
        }
    }

    /// Arguments passed before the generated ones.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    /// Invocation compiling `schema` from `source_dir` into `destination`,
    /// requesting both artifact kinds at once.
    pub fn invocation(
        &self,
        schema: &SchemaFile,
        source_dir: &Path,
        destination: &Path,
        repo_root: &Path,
    ) -> Invocation {
        let mut inv = Invocation::new(&self.program).args(&self.leading_args);
        if !schema.namespace().is_root() {
            let mut mapping = OsString::from("--proto_path=");
            mapping.push(schema.namespace().to_virtual_path());
            mapping.push("=");
            mapping.push(source_dir);
            inv = inv.arg(mapping);
        }
        let mut include = OsString::from("--proto_path=");
        include.push(source_dir);
        inv.arg(include)
            .args(ArtifactKind::ALL.map(|kind| kind.out_arg(destination)))
            .arg(schema.virtual_path())
            .current_dir(repo_root)
    }
}

impl Default for CompilerCommand {
    fn default() -> Self {
        Self::new(rmir_core::config::DEFAULT_COMPILER)
    }
}
