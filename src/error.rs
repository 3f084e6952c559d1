//! Error types for route derivation and request validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while discovering or reading schema documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid glob pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot read glob entry: {source}")]
    Glob {
        #[source]
        source: glob::GlobError,
    },

    #[error("schema file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Pattern { .. } | Self::InvalidJson { .. } => 2,
            _ => 3, // IO
        }
    }
}

/// Errors during `$ref` dereferencing.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("fragment not found: {fragment}")]
    FragmentNotFound { fragment: String },

    #[error("circular reference detected: {reference}")]
    CircularReference { reference: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while resolving a link's URI template against its schema.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("malformed URI template \"{template}\": {message}")]
    Syntax { template: String, message: String },

    #[error("placeholder \"{name}\" in \"{template}\" has no schema definition")]
    UnknownPlaceholder { name: String, template: String },
}

/// Errors during route registration. All of these are fatal to start-up:
/// no partial registration is attempted.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("invalid link {index} in {file}: {message}")]
    InvalidLink {
        file: PathBuf,
        index: usize,
        message: String,
    },

    #[error("cannot compile {source_kind} schema for {method} {path}: {message}")]
    SchemaCompile {
        source_kind: &'static str,
        method: String,
        path: String,
        message: String,
    },

    #[error("no handler bound for {method} {path}")]
    MissingHandler { method: String, path: String },
}

impl RegisterError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Load(e) => e.exit_code(),
            Self::Resolve(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Single request-validation error with path context.
///
/// The canonical error shape for the whole pipeline: `path` is a JSON
/// Pointer (RFC 6901) into the validated value, `message` is the validator
/// engine's own text, attached verbatim.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationFailure {
    /// JSON Pointer to the invalid field; empty for the root value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}
