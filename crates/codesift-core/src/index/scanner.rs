//! File scanning for indexing

use super::cancel::CancellationToken;
use super::hash::{contains_nul, hash_content};
use super::ignore::IgnorePolicy;
use super::types::{FileRecord, ScanReport, SkipEntry, SkipReason};
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Source extensions scanned by default
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".go", ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".py", ".rs", ".java", ".kt", ".kts",
    ".scala", ".c", ".h", ".cc", ".cpp", ".cxx", ".hpp", ".cs", ".rb", ".php", ".swift",
    ".m", ".lua", ".sh", ".bash", ".zsh", ".sql", ".vue", ".svelte", ".ex", ".exs", ".erl",
    ".hs", ".ml", ".clj", ".dart", ".r", ".jl", ".zig", ".proto", ".tf",
];

/// Directories excluded unless the caller supplies its own patterns
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "node_modules/",
    ".git/",
    ".cache/",
    "vendor/",
    "dist/",
    "build/",
    "__pycache__/",
    ".venv/",
    "target/",
];

/// Files above this size are skipped
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Scan options
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions with a leading dot
    pub extensions: HashSet<String>,
    pub max_file_size: u64,
    pub follow_symlinks: bool,
    /// Bound on concurrent file reads in [`TreeScanner::scan_concurrent`]
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            extensions: config.extensions.iter().map(|e| normalize_extension(e)).collect(),
            max_file_size: config.max_file_size,
            follow_symlinks: config.follow_symlinks,
            workers: config.workers.max(1),
        }
    }
}

impl ScanOptions {
    /// Replace the supported extension set
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// True when the path's extension is in the supported set
    pub fn supports(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .map(|ext| {
                let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
                self.extensions.contains(&ext)
            })
            .unwrap_or(false)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Progress of a sequential scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Candidate files found by the walk
    pub total_files: usize,
    pub processed_files: usize,
}

/// Why a single file was not accepted
enum Rejection {
    Skip(SkipReason),
    Io(io::Error),
}

/// Result of enumerating the tree, before any file is read
struct Walk {
    candidates: Vec<(String, PathBuf)>,
    failures: Vec<SkipEntry>,
    cancelled: bool,
}

/// Walks a root directory and turns eligible files into [`FileRecord`]s.
///
/// Cloning is cheap; clones share the ignore policy and options.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    policy: Arc<IgnorePolicy>,
    options: Arc<ScanOptions>,
}

impl TreeScanner {
    pub fn new(root: impl Into<PathBuf>, policy: IgnorePolicy, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            policy: Arc::new(policy),
            options: Arc::new(options),
        }
    }

    /// Build the ignore policy and options from configuration
    pub fn from_config(root: impl Into<PathBuf>, config: &ScanConfig) -> Result<Self> {
        let root = root.into();
        let policy =
            IgnorePolicy::build_with_files(&root, &config.ignore_patterns, &config.ignore_files)?;
        Ok(Self::new(root, policy, ScanOptions::from(config)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> &IgnorePolicy {
        &self.policy
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan the whole tree.
    ///
    /// Fails only when the root cannot be traversed; problems with single
    /// files end up in [`ScanReport::skipped`].
    pub fn scan(&self) -> Result<ScanReport> {
        self.scan_with_cancel(&CancellationToken::new())
    }

    /// Sequential scan that stops early once `cancel` fires
    pub fn scan_with_cancel(&self, cancel: &CancellationToken) -> Result<ScanReport> {
        self.scan_with_progress(cancel, |_| {})
    }

    /// Sequential scan reporting progress after each candidate file.
    ///
    /// `cancel` is checked before every file, so cancelling from the
    /// callback stops the scan before the next read.
    pub fn scan_with_progress<F>(
        &self,
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<ScanReport>
    where
        F: FnMut(ScanProgress),
    {
        let walk = self.walk(cancel)?;
        let total_files = walk.candidates.len();
        let mut report = ScanReport {
            files: Vec::with_capacity(total_files),
            skipped: walk.failures,
            cancelled: walk.cancelled,
        };

        for (processed, (relative, path)) in walk.candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.process(relative, &path) {
                Ok(file) => report.files.push(file),
                Err(skip) => report.skipped.push(skip),
            }
            progress(ScanProgress {
                total_files,
                processed_files: processed + 1,
            });
        }

        report.sort();
        self.log_summary(&report);
        Ok(report)
    }

    /// Scan with file reads fanned out to a bounded pool of blocking tasks.
    ///
    /// Produces the same report as [`TreeScanner::scan`] for the same tree.
    pub async fn scan_concurrent(&self, cancel: &CancellationToken) -> Result<ScanReport> {
        let walker = self.clone();
        let walk_cancel = cancel.clone();
        let walk = tokio::task::spawn_blocking(move || walker.walk(&walk_cancel))
            .await
            .map_err(|e| Error::Worker(e.to_string()))??;

        let workers = self.options.workers.max(1);
        debug!(
            candidates = walk.candidates.len(),
            workers, "Processing scan candidates"
        );

        let outcomes: Vec<_> = stream::iter(walk.candidates)
            .map(|(relative, path)| {
                let scanner = self.clone();
                let cancel = cancel.clone();
                async move {
                    tokio::task::spawn_blocking(move || {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        Some(scanner.process(relative, &path))
                    })
                    .await
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut report = ScanReport {
            files: Vec::with_capacity(outcomes.len()),
            skipped: walk.failures,
            cancelled: walk.cancelled,
        };

        for outcome in outcomes {
            match outcome.map_err(|e| Error::Worker(e.to_string()))? {
                Some(Ok(file)) => report.files.push(file),
                Some(Err(skip)) => report.skipped.push(skip),
                None => report.cancelled = true,
            }
        }

        report.sort();
        self.log_summary(&report);
        Ok(report)
    }

    /// Re-scan a single file without walking the tree
    pub fn scan_one(&self, relative_path: &str) -> Result<FileRecord> {
        let path = Path::new(relative_path);
        let path = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .map_err(|_| Error::NotFound(relative_path.to_string()))?
        } else {
            path
        };
        let relative = normalize_relative(path)
            .ok_or_else(|| Error::NotFound(relative_path.to_string()))?;
        let full = self.root.join(&relative);

        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(Error::NotFound(relative)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::NotFound(relative)),
            Err(source) => return Err(Error::Read { path: relative, source }),
        }

        match self.classify(&relative, &full) {
            Ok(file) => Ok(file),
            Err(Rejection::Skip(reason)) => Err(Error::Skipped {
                path: relative,
                reason,
            }),
            Err(Rejection::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(relative))
            }
            Err(Rejection::Io(source)) => Err(Error::Read {
                path: relative,
                source,
            }),
        }
    }

    /// Enumerate regular files, pruning ignored directories
    fn walk(&self, cancel: &CancellationToken) -> Result<Walk> {
        let root_meta = std::fs::metadata(&self.root).map_err(|source| Error::Scan {
            root: self.root.clone(),
            source,
        })?;
        if !root_meta.is_dir() {
            return Err(Error::Scan {
                root: self.root.clone(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }

        let mut walk = Walk {
            candidates: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        };

        let walker = WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_pruned(e));

        for entry in walker {
            if cancel.is_cancelled() {
                walk.cancelled = true;
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::Scan {
                        root: self.root.clone(),
                        source: walk_error_to_io(err),
                    });
                }
                Err(err) => {
                    let relative = err
                        .path()
                        .map(|p| self.relative_path(p))
                        .unwrap_or_default();
                    warn!(path = %relative, error = %err, "Failed to walk entry");
                    walk.failures
                        .push(SkipEntry::new(relative, SkipReason::ReadError).with_detail(err.to_string()));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative_path(entry.path());
            walk.candidates.push((relative, entry.into_path()));
        }

        Ok(walk)
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let relative = self.relative_path(entry.path());
        let pruned = self.policy.matches_dir(&relative);
        if pruned {
            debug!(path = %relative, "Pruning ignored directory");
        }
        pruned
    }

    /// Turn one candidate into a record or a skip entry
    fn process(&self, relative: String, path: &Path) -> std::result::Result<FileRecord, SkipEntry> {
        match self.classify(&relative, path) {
            Ok(file) => {
                debug!(path = %file.path, size = file.size, "Accepted file");
                Ok(file)
            }
            Err(Rejection::Skip(reason)) => {
                debug!(path = %relative, %reason, "Skipped file");
                Err(SkipEntry::new(relative, reason))
            }
            Err(Rejection::Io(e)) => {
                warn!(path = %relative, error = %e, "Failed to read file");
                Err(SkipEntry::new(relative, SkipReason::ReadError).with_detail(e.to_string()))
            }
        }
    }

    /// Filter order: ignore policy, extension, size, read, NUL byte
    fn classify(&self, relative: &str, path: &Path) -> std::result::Result<FileRecord, Rejection> {
        if self.policy.matches(relative) {
            return Err(Rejection::Skip(SkipReason::Ignored));
        }
        if !self.options.supports(relative) {
            return Err(Rejection::Skip(SkipReason::UnsupportedExtension));
        }

        let meta = std::fs::metadata(path).map_err(Rejection::Io)?;
        if meta.len() > self.options.max_file_size {
            return Err(Rejection::Skip(SkipReason::TooLarge));
        }

        let bytes = std::fs::read(path).map_err(Rejection::Io)?;
        // The file may have grown since the metadata call
        if bytes.len() as u64 > self.options.max_file_size {
            return Err(Rejection::Skip(SkipReason::TooLarge));
        }
        if contains_nul(&bytes) {
            return Err(Rejection::Skip(SkipReason::BinaryContent));
        }

        Ok(FileRecord {
            path: relative.to_string(),
            fingerprint: hash_content(&bytes),
            size: bytes.len() as u64,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        to_relative_string(relative)
    }

    fn log_summary(&self, report: &ScanReport) {
        info!(
            root = %self.root.display(),
            files = report.files.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "Scan finished"
        );
    }
}

/// `/`-joined normal components of a relative path
fn to_relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Like [`to_relative_string`], but `None` for paths that are empty or could
/// leave the root (`..`, a root or a drive prefix)
fn normalize_relative(path: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::Normal(s) => segments.push(s.to_string_lossy()),
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir
            | std::path::Component::RootDir
            | std::path::Component::Prefix(_) => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

fn walk_error_to_io(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
}
