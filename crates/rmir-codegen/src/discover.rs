//! # Schema Discovery
//!
//! Lists schema files directly inside the source directory. The listing is
//! not recursive and is sorted by file name, so compiler invocations and
//! their log lines happen in the same order on every filesystem.

use std::path::{Path, PathBuf};

use crate::error::CodegenError;

/// File extension identifying schema files.
pub const SCHEMA_EXTENSION: &str = "proto";

/// Paths of every `*.proto` regular file directly inside `dir`, sorted.
///
/// A missing directory is an error rather than an empty result. An existing
/// directory with no schema files yields an empty list.
pub fn discover_schemas(dir: &Path) -> Result<Vec<PathBuf>, CodegenError> {
    if !dir.is_dir() {
        return Err(CodegenError::MissingSourceDirectory {
            path: dir.to_path_buf(),
        });
    }
    let read_err = |source| CodegenError::ReadSourceDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut schemas = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION) {
            schemas.push(path);
        }
    }
    schemas.sort();
    tracing::debug!(dir = %dir.display(), count = schemas.len(), "discovered schemas");
    Ok(schemas)
}
