//! Change detection for incremental reindexing

use super::types::FileRecord;

/// True when the file has no recorded fingerprint or the recorded one differs.
///
/// Fingerprint equality is the only criterion; content is never diffed.
pub fn needs_reindex(previous_fingerprint: Option<&str>, current: &FileRecord) -> bool {
    match previous_fingerprint {
        Some(previous) => previous != current.fingerprint,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hash::hash_content;

    fn record(content: &str) -> FileRecord {
        FileRecord {
            path: "main.go".to_string(),
            content: content.to_string(),
            fingerprint: hash_content(content.as_bytes()),
            size: content.len() as u64,
        }
    }

    #[test]
    fn test_absent_fingerprint_needs_reindex() {
        assert!(needs_reindex(None, &record("package main")));
    }

    #[test]
    fn test_equal_fingerprint_is_unchanged() {
        let current = record("package main");
        assert!(!needs_reindex(Some(&current.fingerprint), &current));
    }

    #[test]
    fn test_single_byte_edit_needs_reindex() {
        let before = record("package main");
        let after = record("package mair");
        assert!(needs_reindex(Some(&before.fingerprint), &after));
    }
}
