//! Records produced by scanning and chunking

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source file that passed the extension, ignore, size and binary checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root, `/`-separated
    pub path: String,
    /// File text (invalid UTF-8 sequences replaced)
    pub content: String,
    /// SHA-256 of the raw file bytes, lowercase hex
    pub fingerprint: String,
    /// Size of the raw file in bytes
    pub size: u64,
}

/// Why a candidate file was not turned into a [`FileRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Ignored,
    UnsupportedExtension,
    TooLarge,
    BinaryContent,
    ReadError,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::UnsupportedExtension => "unsupported-extension",
            Self::TooLarge => "too-large",
            Self::BinaryContent => "binary-content",
            Self::ReadError => "read-error",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A candidate file that was skipped, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEntry {
    pub path: String,
    pub reason: SkipReason,
    /// Underlying error message for `read-error` skips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkipEntry {
    pub fn new(path: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A contiguous, line-bounded slice of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `{file_path}_{index}`, unique within a file
    pub id: String,
    pub file_path: String,
    /// Position of the chunk within its file, starting at 0
    pub index: usize,
    /// First line (1-indexed, inclusive)
    pub start_line: usize,
    /// Last line (1-indexed, inclusive)
    pub end_line: usize,
    pub content: String,
    /// Short blake3 digest of the undecorated window
    pub fingerprint: String,
}

impl ChunkRecord {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Accepted files, sorted by path
    pub files: Vec<FileRecord>,
    /// Skipped files, sorted by path
    pub skipped: Vec<SkipEntry>,
    /// Set when the scan stopped early; `files` and `skipped` hold what finished
    pub cancelled: bool,
}

impl ScanReport {
    /// Number of skipped files with the given reason
    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    pub(crate) fn sort(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
        self.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    }
}
