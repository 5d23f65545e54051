//! Codesift Core Library
//!
//! Prepares a source tree for semantic code search.
//!
//! # Features
//! - `.gitignore`-style ignore rules with directory pruning
//! - Concurrent, cancellable tree scanning with a per-file skip report
//! - Overlapping line-window chunking with stable chunk ids
//! - SHA-256 file fingerprints and blake3 chunk fingerprints for
//!   incremental reindexing

pub mod config;
pub mod error;
pub mod index;

pub use config::{ChunkingConfig, IndexConfig, ScanConfig};
pub use error::{CodesiftError, Error, Result};
pub use index::{
    estimate_tokens, needs_reindex, plan_reindex, CancellationToken, ChunkRecord, Chunker,
    ChunkerConfig, FileChunks, FileRecord, IgnorePolicy, ReindexPlan, ScanOptions, ScanProgress,
    ScanReport, SkipEntry, SkipReason, TreeScanner,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "codesift";
