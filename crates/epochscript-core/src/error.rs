//! Error types for EpochScript parsing operations
//!
//! Lexical and syntax errors never surface here: they are embedded in the
//! tree and reported through [`crate::SyntaxTree::errors`]. `EpochError`
//! covers caller contract violations and configuration I/O.

use std::path::PathBuf;
use thiserror::Error;

use crate::cst::EditViolation;

/// Main error type for EpochScript operations
#[derive(Debug, Error)]
pub enum EpochError {
    /// An edit batch handed to the incremental reparser broke its contract
    #[error("Inconsistent edit batch: edit {index} {reason}")]
    IncrementalInconsistency { index: usize, reason: EditViolation },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Incremental,
    Config,
    Io,
}

impl EpochError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EpochError::IncrementalInconsistency { .. } => ErrorKind::Incremental,
            EpochError::ConfigError { .. } => ErrorKind::Config,
            EpochError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Create an incremental inconsistency error for the edit at `index`
    pub fn incremental_inconsistency(index: usize, reason: EditViolation) -> Self {
        Self::IncrementalInconsistency { index, reason }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for EpochError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
