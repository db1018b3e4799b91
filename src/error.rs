use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the appearance mover.
#[derive(Debug, Error)]
pub enum AppMoverError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Relocation(#[from] RelocationError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Errors raised while reading a source document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected {record} record on line {line}")]
    UnexpectedRecord { line: usize, record: &'static str },
}

/// Errors raised while writing a destination document.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to write document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("document structure violated: {0}")]
    Structure(String),
}

/// Errors raised by the relocation engine's state machine.
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("relocation engine is finalized and accepts no further features")]
    Finalized,
}

/// Errors related to batch file handling.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("output file '{}' already exists, remove it first", .0.display())]
    OutputExists(PathBuf),

    #[error("failed to replace '{}': {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input path '{}'", .0.display())]
    InvalidPath(PathBuf),
}

/// Convenience type alias for results using [`AppMoverError`].
pub type Result<T> = std::result::Result<T, AppMoverError>;
