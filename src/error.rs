//! Run-level and file-level errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::SyntaxError;

/// Errors produced while processing a repository.
///
/// Variants for which [`DocfillError::is_fatal`] holds abort the run. The
/// others are confined to a single file, which is reported and skipped.
#[derive(Debug, Error)]
pub enum DocfillError {
    /// The `--llm` value names no known backend.
    #[error("LLM backend '{0}' is not supported yet")]
    UnsupportedBackend(String),

    /// The file is not valid Python.
    #[error("{}: {source}", path.display())]
    Parse {
        /// File being processed.
        path: PathBuf,
        /// Where parsing failed.
        source: SyntaxError,
    },

    /// The file could not be read.
    #[error("{}: failed to read: {source}", path.display())]
    Read {
        /// File being processed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The transformed text could not be written back.
    #[error("{}: failed to write: {source}", path.display())]
    Write {
        /// File being processed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The `.bak` copy could not be made; the original is left untouched.
    #[error("{}: failed to create backup: {source}", path.display())]
    Backup {
        /// File being processed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The repository root could not be traversed.
    #[error("{}: failed to list files: {source}", path.display())]
    Walk {
        /// Repository root.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// A replay cassette could not be loaded.
    #[error("cassette error: {0}")]
    Cassette(String),

    /// The tokio runtime could not be built.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl DocfillError {
    /// Whether the error ends the whole run rather than one file.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBackend(_) | Self::Walk { .. } | Self::Cassette(_) | Self::Runtime(_)
        )
    }
}
