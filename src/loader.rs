//! Schema document loading and glob-based discovery.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` for a missing file, `LoadError::Read`
/// for any other IO failure, or `LoadError::InvalidJson`.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(LoadError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    load_schema_str(&content)
}

/// Parse a schema document from a JSON string.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Discover schema documents matching a glob pattern.
///
/// Returns matching file paths in glob order (alphabetical within each
/// directory), which fixes the registration order across documents.
/// A pattern naming a single explicit file yields that one path.
///
/// # Errors
///
/// Returns `LoadError::Pattern` for an invalid pattern, or
/// `LoadError::Glob` if a matched entry cannot be read.
pub fn discover_schemas(pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let paths = glob::glob(pattern).map_err(|source| LoadError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|source| LoadError::Glob { source })?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
