use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the outlier detection library.
#[derive(Debug, Error)]
pub enum OutlierError {
    /// Malformed or empty signal or dataset.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A metric or detector name that is not registered.
    #[error("unknown {kind} '{name}'")]
    UnknownOption { kind: &'static str, name: String },

    /// A parameter outside its accepted range, or an unsupported join mode.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The series file could not be read or does not describe a series.
    #[error("failed to load {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The data directory is missing or could not be walked.
    #[error("cannot scan {}: {reason}", path.display())]
    Discovery { path: PathBuf, reason: String },

    /// A manifest entry whose recorded digest differs from the file contents.
    #[error("hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, OutlierError>;
