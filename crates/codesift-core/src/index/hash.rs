//! Content fingerprints
//!
//! Fingerprints are for change detection only, not for security.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex digits kept from a chunk fingerprint
pub const CHUNK_HASH_LEN: usize = 16;

/// SHA-256 of raw bytes, lowercase hex
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint a file on disk
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_content(&bytes))
}

/// Short blake3 fingerprint of a chunk window.
///
/// Covers the file path, the 0-based half-open line range and the
/// undecorated text, so moving or renaming a chunk changes it.
pub fn compute_chunk_hash(file_path: &str, start: usize, end: usize, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b":");
    hasher.update(start.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(end.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(text.as_bytes());
    let hash = hasher.finalize();
    hash.to_hex()[..CHUNK_HASH_LEN].to_string()
}

/// True when the bytes contain a NUL anywhere
pub fn contains_nul(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_content_known_value() {
        assert_eq!(
            hash_content(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_single_byte_change_changes_hash() {
        assert_ne!(hash_content(b"fn main() {}"), hash_content(b"fn main() {]"));
    }

    #[test]
    fn test_hash_file_is_stable() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("test.txt");
        std::fs::write(&file, "test content").unwrap();

        let first = hash_file(&file).unwrap();
        let second = hash_file(&file).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, hash_content(b"test content"));
    }

    #[test]
    fn test_chunk_hash_length_and_stability() {
        let a = compute_chunk_hash("main.go", 0, 10, "package main");
        let b = compute_chunk_hash("main.go", 0, 10, "package main");
        assert_eq!(a, b);
        assert_eq!(a.len(), CHUNK_HASH_LEN);
    }

    #[test]
    fn test_chunk_hash_depends_on_window() {
        let base = compute_chunk_hash("main.go", 0, 10, "package main");
        assert_ne!(base, compute_chunk_hash("cmd.go", 0, 10, "package main"));
        assert_ne!(base, compute_chunk_hash("main.go", 1, 10, "package main"));
        assert_ne!(base, compute_chunk_hash("main.go", 0, 11, "package main"));
    }

    #[test]
    fn test_contains_nul() {
        assert!(!contains_nul(b"hello world"));
        assert!(contains_nul(b"hello\x00world"));
        assert!(!contains_nul(b""));
        assert!(contains_nul(&[0]));
    }
}
