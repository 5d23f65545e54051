//! Error types for codesift

use crate::index::SkipReason;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using CodesiftError
pub type Result<T> = std::result::Result<T, CodesiftError>;

/// Error type alias for convenience
pub type Error = CodesiftError;

/// Exit codes for CLIs embedding the library
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for codesift
///
/// Only root-level and single-file lookups fail with an error. Problems with
/// individual files during a walk are reported as skip entries instead.
#[derive(Debug, Error)]
pub enum CodesiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot traverse scan root {}: {source}", root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path} is not eligible for indexing: {reason}")]
    Skipped { path: String, reason: SkipReason },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl CodesiftError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Yaml(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
