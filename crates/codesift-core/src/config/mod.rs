//! Configuration management

use crate::error::Result;
use crate::index::{
    ChunkerConfig, ScanOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_EXTENSIONS,
    DEFAULT_IGNORE_FILES, DEFAULT_IGNORE_PATTERNS, DEFAULT_MAX_FILE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    /// Tree scanning configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunker: ChunkingConfig,
}

/// Which files are scanned and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Supported file extensions, with the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Ignore files read from the scan root
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,

    /// Extra ignore patterns applied on top of the ignore files
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default)]
    pub follow_symlinks: bool,

    /// Size of the scanning worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_files: default_ignore_files(),
            ignore_patterns: default_ignore_patterns(),
            max_file_size: default_max_file_size(),
            follow_symlinks: false,
            workers: default_workers(),
        }
    }
}

/// Chunk sizing, in approximate tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub target_size: i64,

    #[serde(default = "default_chunk_overlap")]
    pub overlap: i64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_ignore_files() -> Vec<String> {
    DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect()
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_chunk_size() -> i64 {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> i64 {
    DEFAULT_CHUNK_OVERLAP
}

impl IndexConfig {
    /// Load config from default path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            IndexConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: IndexConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a YAML file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Apply `CODESIFT_*` overrides looked up through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "CODESIFT_CHUNK_SIZE") {
            self.chunker.target_size = v;
        }
        if let Some(v) = parse_override(&lookup, "CODESIFT_CHUNK_OVERLAP") {
            self.chunker.overlap = v;
        }
        if let Some(v) = parse_override(&lookup, "CODESIFT_MAX_FILE_SIZE") {
            self.scan.max_file_size = v;
        }
        if let Some(v) = parse_override(&lookup, "CODESIFT_WORKERS") {
            self.scan.workers = v;
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::from(&self.scan)
    }

    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig::from(&self.chunker)
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable override");
            None
        }
    }
}
