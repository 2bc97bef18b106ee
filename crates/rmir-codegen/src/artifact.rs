//! # Generated Artifacts
//!
//! Every schema produces exactly two artifacts, both requested from a single
//! compiler invocation: the Python implementation module and its type stub.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::schema::SchemaFile;

/// Kind of generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// `<module>.py`, from `--python_out`.
    Implementation,
    /// `<module>.pyi`, from `--pyi_out`.
    TypeStub,
}

impl ArtifactKind {
    /// Both kinds, in the order they are requested from the compiler.
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Implementation, ArtifactKind::TypeStub];

    /// Compiler option selecting this output.
    pub fn out_option(self) -> &'static str {
        match self {
            ArtifactKind::Implementation => "--python_out",
            ArtifactKind::TypeStub => "--pyi_out",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Implementation => "py",
            ArtifactKind::TypeStub => "pyi",
        }
    }

    /// `--python_out=<destination>` style argument.
    pub fn out_arg(self, destination: &Path) -> OsString {
        let mut arg = OsString::from(self.out_option());
        arg.push("=");
        arg.push(destination);
        arg
    }
}

/// One expected output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Location relative to the repository root (or absolute when the
    /// destination directory is configured absolute).
    pub path: PathBuf,
}

impl Artifact {
    /// The two artifacts `schema` generates under `destination`.
    pub fn for_schema(schema: &SchemaFile, destination: &Path) -> [Artifact; 2] {
        let module = destination
            .join(schema.namespace().to_path())
            .join(schema.module_path());
        ArtifactKind::ALL.map(|kind| Artifact {
            kind,
            path: module.with_extension(kind.extension()),
        })
    }
}
