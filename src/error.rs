//! Error types for the pgpg-profile library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed line {line} in {path:?}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid count value '{value}' at line {line} of {path:?}")]
    InvalidCount {
        value: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Missing column '{column}' in {path:?}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Output file {0:?} already exists; pass --append or --truncate to reuse it")]
    OutputExists(PathBuf),

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("Export failed running '{command}': {reason}")]
    ExportFailed { command: String, reason: String },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProfileError {
    /// Build a parse error for a 1-based line of `path`.
    pub(crate) fn parse(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        ProfileError::Parse {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ProfileError>;
