//! # Schema Files and Namespaces
//!
//! A [`SchemaFile`] is a `.proto` file on disk together with the namespace
//! declared by its `package` statement. The namespace decides where the
//! generated artifacts land: `package music.note;` places them under
//! `music/note/` in the destination tree.
//!
//! Only the top-level `package` statement is interpreted. Comments, string
//! literals and everything inside braces are skipped, so that
//! `// package old.name;`, `option java_package = "x";` or a message field
//! named `package` are never mistaken for a declaration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CodegenError;

/// Dotted package name, e.g. `music.note`. The root namespace has no
/// segments and corresponds to a schema without a `package` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct Namespace(Vec<String>);

/// A package name that is not a dotted sequence of identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNamespace(pub String);

impl Namespace {
    /// The namespace of a schema without a `package` statement.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Relative directory mirroring the namespace (`music.note` → `music/note`).
    pub fn to_path(&self) -> PathBuf {
        self.0.iter().collect()
    }

    /// `/`-separated form, as protoc expects in virtual include paths.
    pub fn to_virtual_path(&self) -> String {
        self.0.join("/")
    }
}

impl FromStr for Namespace {
    type Err = InvalidNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(InvalidNamespace(s.to_string()));
        }
        let segments: Vec<String> = compact.split('.').map(str::to_string).collect();
        if segments.iter().all(|seg| is_identifier(seg)) {
            Ok(Self(segments))
        } else {
            Err(InvalidNamespace(s.trim().to_string()))
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.to_string()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A schema definition file and its declared namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaFile {
    path: PathBuf,
    file_name: String,
    namespace: Namespace,
}

impl SchemaFile {
    /// Read `path` and extract its namespace.
    pub fn read(path: &Path) -> Result<Self, CodegenError> {
        let text = std::fs::read_to_string(path).map_err(|source| CodegenError::ReadSchema {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &text)
    }

    /// Build from already-loaded schema text.
    pub fn from_source(path: &Path, text: &str) -> Result<Self, CodegenError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CodegenError::ReadSchema {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            })?;
        let namespace = match declared_package(text) {
            None => Namespace::root(),
            Some(declared) => {
                declared
                    .parse::<Namespace>()
                    .map_err(|InvalidNamespace(declared)| CodegenError::InvalidNamespace {
                        path: path.to_path_buf(),
                        declared,
                    })?
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            namespace,
        })
    }

    /// Same schema addressed through a different path.
    pub fn with_path(self, path: PathBuf) -> Self {
        Self { path, ..self }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Where protoc's Python generators put the module, relative to the
    /// namespace directory and without extension: the file stem with `-`
    /// replaced by `_` and suffixed `_pb2`, each `.` opening a directory
    /// (`a.b.proto` → `a/b_pb2`).
    pub fn module_path(&self) -> PathBuf {
        let stem = self
            .file_name
            .strip_suffix(".proto")
            .unwrap_or(&self.file_name);
        format!("{}_pb2", stem.replace('-', "_"))
            .split('.')
            .collect()
    }

    /// Path of the schema as protoc sees it through the namespace mapping.
    pub fn virtual_path(&self) -> String {
        if self.namespace.is_root() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.namespace.to_virtual_path(), self.file_name)
        }
    }
}

/// Text of the first top-level `package` statement.
fn declared_package(text: &str) -> Option<String> {
    static PACKAGE: OnceLock<Regex> = OnceLock::new();
    let re = PACKAGE.get_or_init(|| {
        Regex::new(r"(?:^|;)\s*package\s+([^;]*);").expect("package pattern is valid")
    });
    let code = top_level(&strip_comments_and_strings(text));
    re.captures(&code).map(|caps| caps[1].trim().to_string())
}

/// Drop every `{ ... }` block, leaving a `;` in its place so the next
/// top-level statement still starts after a statement boundary.
fn top_level(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut depth = 0usize;
    for c in code.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    out.push(';');
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(';');
                }
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Replace comments with a space and drop string literal contents.
fn strip_comments_and_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            '"' | '\'' => {
                let quote = c;
                let mut escaped = false;
                for c in chars.by_ref() {
                    match c {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        _ if c == quote => break,
                        _ => {}
                    }
                }
                out.push_str("\"\"");
            }
            _ => out.push(c),
        }
    }
    out
}
