use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures of a generation run.
///
/// Every variant is fatal to the run and carries enough context (file, schema, identifier)
/// to locate the cause. None are retried: the same input reproduces the same failure.
#[derive(Debug, Error)]
pub enum GenError {
    /// The API description is missing, unreadable or malformed.
    #[error("failed to load spec {}: {message}", .path.display())]
    SpecLoad { path: PathBuf, message: String },

    /// A required field of the API description is missing or inconsistent.
    #[error("invalid spec: {0}")]
    SpecValidation(String),

    #[error("invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// A dangling, malformed or cyclic `$ref`.
    #[error("schema reference {reference:?} at {location}: {reason}")]
    SchemaRef {
        reference: String,
        location: String,
        reason: String,
    },

    /// Generated source failed to parse. `source_code` holds the unformatted buffer.
    #[error("generated {file} is not valid Rust: {message}")]
    CodeFormat {
        file: String,
        message: String,
        source_code: String,
    },

    /// The existing handler file failed to parse; nothing was merged.
    #[error("cannot merge into {}: {message}", .path.display())]
    MergeParse { path: PathBuf, message: String },

    #[error("failed to {action} {}: {source}", .path.display())]
    FileIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenError {
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        GenError::FileIo {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn schema_ref(
        reference: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GenError::SchemaRef {
            reference: reference.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// The raw buffer of a [`GenError::CodeFormat`].
    pub fn raw_buffer(&self) -> Option<&str> {
        match self {
            GenError::CodeFormat { source_code, .. } => Some(source_code),
            _ => None,
        }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;
