//! Incremental reindex planning
//!
//! Combines a scan report with the fingerprints the indexer stored after its
//! previous run, and chunks only what changed.

use super::change::needs_reindex;
use super::chunker::Chunker;
use super::types::{ChunkRecord, FileRecord, ScanReport, SkipEntry};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A changed file together with its fresh chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunks {
    pub file: FileRecord,
    pub chunks: Vec<ChunkRecord>,
}

/// What the indexer has to do after a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexPlan {
    /// New or modified files, sorted by path
    pub changed: Vec<FileChunks>,
    /// Paths whose fingerprint matches the previous run
    pub unchanged: Vec<String>,
    /// Previously indexed paths no longer present in the scan
    pub removed: Vec<String>,
    pub skipped: Vec<SkipEntry>,
    /// Copied from the scan; `removed` is left empty when set
    pub cancelled: bool,
    /// Fingerprint of every accepted file, to persist for the next run
    fingerprints: HashMap<String, String>,
}

impl ReindexPlan {
    /// Fingerprints to store once the changed chunks are indexed
    pub fn fingerprints(&self) -> &HashMap<String, String> {
        &self.fingerprints
    }

    pub fn chunk_count(&self) -> usize {
        self.changed.iter().map(|f| f.chunks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Decide which files need re-chunking and chunk them.
///
/// `previous` maps root-relative paths to the fingerprints recorded by the
/// last indexing run.
pub fn plan_reindex(
    report: ScanReport,
    previous: &HashMap<String, String>,
    chunker: &Chunker,
) -> ReindexPlan {
    let fingerprints: HashMap<String, String> = report
        .files
        .iter()
        .map(|f| (f.path.clone(), f.fingerprint.clone()))
        .collect();

    let (changed_files, unchanged_files): (Vec<FileRecord>, Vec<FileRecord>) = report
        .files
        .into_iter()
        .partition(|f| needs_reindex(previous.get(&f.path).map(String::as_str), f));

    let removed = if report.cancelled {
        Vec::new()
    } else {
        let present: HashSet<&str> = fingerprints.keys().map(String::as_str).collect();
        let mut removed: Vec<String> = previous
            .keys()
            .filter(|path| !present.contains(path.as_str()))
            .cloned()
            .collect();
        removed.sort();
        removed
    };

    let chunks = chunker.chunk_files(&changed_files);
    let changed: Vec<FileChunks> = changed_files
        .into_iter()
        .zip(chunks)
        .map(|(file, chunks)| FileChunks { file, chunks })
        .collect();

    let plan = ReindexPlan {
        changed,
        unchanged: unchanged_files.into_iter().map(|f| f.path).collect(),
        removed,
        skipped: report.skipped,
        cancelled: report.cancelled,
        fingerprints,
    };

    info!(
        changed = plan.changed.len(),
        unchanged = plan.unchanged.len(),
        removed = plan.removed.len(),
        chunks = plan.chunk_count(),
        "Planned reindex"
    );

    plan
}
