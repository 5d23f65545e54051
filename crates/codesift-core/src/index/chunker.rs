//! Line-window chunking for embedding
//!
//! Sizes are expressed in tokens but applied to whole lines using a fixed
//! tokens-per-line ratio. This is an approximation; an exact tokenizer could
//! replace it without changing the coverage or overlap rules.

use super::hash::compute_chunk_hash;
use super::types::{ChunkRecord, FileRecord};
use crate::config::ChunkingConfig;

// Default chunk sizing, in approximate tokens
pub const DEFAULT_CHUNK_SIZE: i64 = 512;
pub const DEFAULT_CHUNK_OVERLAP: i64 = 50;

/// Assumed average tokens per source line
pub const TOKENS_PER_LINE: usize = 10;

/// Assumed tokens per whitespace-separated word, for [`estimate_tokens`]
const TOKENS_PER_WORD: f64 = 1.3;

/// Normalized chunk sizing: `target_size > overlap >= 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    target_size: usize,
    overlap: usize,
}

impl ChunkerConfig {
    /// Never fails: a non-positive size or negative overlap falls back to the
    /// defaults, and an overlap that is not smaller than the size is cut to a
    /// tenth of the size.
    pub fn new(target_size: i64, overlap: i64) -> Self {
        let target_size = if target_size <= 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            target_size
        };
        let mut overlap = if overlap < 0 {
            DEFAULT_CHUNK_OVERLAP
        } else {
            overlap
        };
        if overlap >= target_size {
            overlap = target_size / 10;
        }

        Self {
            target_size: target_size as usize,
            overlap: overlap as usize,
        }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Window length in lines, at least 1
    pub fn lines_per_chunk(&self) -> usize {
        (self.target_size / TOKENS_PER_LINE).max(1)
    }

    /// Lines shared between neighbouring windows, at least 1
    pub fn overlap_lines(&self) -> usize {
        (self.overlap / TOKENS_PER_LINE).max(1)
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl From<&ChunkingConfig> for ChunkerConfig {
    fn from(config: &ChunkingConfig) -> Self {
        Self::new(config.target_size, config.overlap)
    }
}

/// Splits file text into overlapping line windows
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    workers: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self { config, workers }
    }

    /// Bound the pool used by [`Chunker::chunk_files`]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Chunk one file. Empty or whitespace-only content gives no chunks.
    pub fn chunk(&self, file_path: &str, content: &str) -> Vec<ChunkRecord> {
        let lines: Vec<&str> = content.split('\n').collect();
        let total = lines.len();
        let lines_per_chunk = self.config.lines_per_chunk();
        let overlap_lines = self.config.overlap_lines();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + lines_per_chunk).min(total);
            let text = lines[start..end].join("\n");

            if text.trim().is_empty() {
                start = end;
                continue;
            }

            let index = chunks.len();
            chunks.push(ChunkRecord {
                id: format!("{}_{}", file_path, index),
                file_path: file_path.to_string(),
                index,
                start_line: start + 1,
                end_line: end,
                fingerprint: compute_chunk_hash(file_path, start, end, &text),
                content: text,
            });

            let next = end - overlap_lines.min(end);
            start = if next <= start { end } else { next };
        }

        chunks
    }

    /// Like [`Chunker::chunk`], with each chunk's content prefixed by a
    /// `File: <path>` header. Ids, line ranges and fingerprints are those of
    /// the undecorated chunks.
    pub fn chunk_with_context(&self, file_path: &str, content: &str) -> Vec<ChunkRecord> {
        self.chunk(file_path, content)
            .into_iter()
            .map(|mut chunk| {
                chunk.content = format!("File: {}\n\n{}", file_path, chunk.content);
                chunk
            })
            .collect()
    }

    /// Chunk many files on a bounded pool of scoped threads.
    ///
    /// Output order matches input order.
    pub fn chunk_files(&self, files: &[FileRecord]) -> Vec<Vec<ChunkRecord>> {
        if files.is_empty() {
            return Vec::new();
        }
        let workers = self.workers.min(files.len());
        if workers <= 1 {
            return files
                .iter()
                .map(|f| self.chunk(&f.path, &f.content))
                .collect();
        }

        let shard_len = files.len().div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(shard_len)
                .map(|shard| {
                    scope.spawn(move || {
                        shard
                            .iter()
                            .map(|f| self.chunk(&f.path, &f.content))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(shard) => shard,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// Rough token count: whitespace-separated words times 1.3
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD) as usize
}
