//! End-to-end tests for the scan → chunk → fingerprint pipeline
//!
//! Tests:
//! 1. Scanning a small source tree
//! 2. Binary and ignored content in the skip report
//! 3. Incremental reindex after an edit, an add and a delete
//! 4. Configuration-driven scanning

use codesift_core::{
    needs_reindex, plan_reindex, CancellationToken, Chunker, ChunkerConfig, IgnorePolicy,
    IndexConfig, ScanOptions, SkipReason, TreeScanner,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn default_scanner(root: &Path) -> TreeScanner {
    let policy = IgnorePolicy::build(root, &[]).unwrap();
    TreeScanner::new(root, policy, ScanOptions::default())
}

#[test]
fn test_scan_two_source_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {}").unwrap();
    fs::write(temp.path().join("app.js"), "console.log('x');").unwrap();

    let report = default_scanner(temp.path()).scan().unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.skipped.len(), 0);
    for file in &report.files {
        assert!(!file.path.is_empty());
        assert!(!file.fingerprint.is_empty());
        assert!(!file.content.is_empty());
    }
}

#[test]
fn test_scan_binary_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("binary.go"), b"package main\x00\x00\x00").unwrap();

    let report = default_scanner(temp.path()).scan().unwrap();

    assert_eq!(report.files.len(), 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "binary.go");
    assert_eq!(report.skipped[0].reason, SkipReason::BinaryContent);
}

#[test]
fn test_every_candidate_yields_exactly_one_outcome() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join(".gitignore"), "generated/\n*.snap\n").unwrap();
    fs::create_dir_all(root.join("generated")).unwrap();
    fs::write(root.join("generated/schema.rs"), "pub struct S;").unwrap();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::write(root.join("src/lib.rs"), "pub mod nested;").unwrap();
    fs::write(root.join("src/nested/mod.rs"), "pub fn f() {}").unwrap();
    fs::write(root.join("src/lib.snap"), "snapshot").unwrap();
    fs::write(root.join("src/blob.rs"), b"\x00fn").unwrap();
    fs::write(root.join("README"), "readme").unwrap();

    let report = default_scanner(root).scan().unwrap();

    let accepted: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(accepted, vec!["src/lib.rs", "src/nested/mod.rs"]);

    let skipped: Vec<(&str, SkipReason)> = report
        .skipped
        .iter()
        .map(|s| (s.path.as_str(), s.reason))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (".gitignore", SkipReason::UnsupportedExtension),
            ("README", SkipReason::UnsupportedExtension),
            ("src/blob.rs", SkipReason::BinaryContent),
            ("src/lib.snap", SkipReason::Ignored),
        ]
    );

    for file in &report.files {
        assert!(!report.skipped.iter().any(|s| s.path == file.path));
    }
}

#[test]
fn test_scan_is_reproducible() {
    let temp = TempDir::new().unwrap();
    for name in ["z.py", "a.py", "m.py"] {
        fs::write(temp.path().join(name), format!("# {}", name)).unwrap();
    }
    let scanner = default_scanner(temp.path());
    assert_eq!(scanner.scan().unwrap(), scanner.scan().unwrap());
}

#[test]
fn test_incremental_reindex_cycle() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("keep.rs"), "fn keep() {}\n").unwrap();
    fs::write(root.join("edit.rs"), "fn edit() {}\n").unwrap();
    fs::write(root.join("drop.rs"), "fn drop_me() {}\n").unwrap();

    let scanner = default_scanner(root);
    let chunker = Chunker::new(ChunkerConfig::new(100, 10));

    let first = plan_reindex(scanner.scan().unwrap(), &HashMap::new(), &chunker);
    assert_eq!(first.changed.len(), 3);
    let stored = first.fingerprints().clone();

    fs::write(root.join("edit.rs"), "fn edit() { println!(\"x\"); }\n").unwrap();
    fs::remove_file(root.join("drop.rs")).unwrap();
    fs::write(root.join("new.rs"), "fn new() {}\n").unwrap();

    let second = plan_reindex(scanner.scan().unwrap(), &stored, &chunker);
    let changed: Vec<&str> = second.changed.iter().map(|c| c.file.path.as_str()).collect();
    assert_eq!(changed, vec!["edit.rs", "new.rs"]);
    assert_eq!(second.unchanged, vec!["keep.rs".to_string()]);
    assert_eq!(second.removed, vec!["drop.rs".to_string()]);

    let edited = scanner.scan_one("edit.rs").unwrap();
    assert!(needs_reindex(stored.get("edit.rs").map(String::as_str), &edited));
    let kept = scanner.scan_one("keep.rs").unwrap();
    assert!(!needs_reindex(stored.get("keep.rs").map(String::as_str), &kept));
}

#[test]
fn test_scanner_from_config() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::write(root.join("target/debug/build.rs"), "fn main() {}").unwrap();
    fs::write(root.join("notes.md"), "# Notes").unwrap();
    fs::write(root.join("lib.rs"), "pub fn x() {}").unwrap();

    let mut config = IndexConfig::default();
    config.scan.extensions.push(".md".to_string());
    let scanner = TreeScanner::from_config(root, &config.scan).unwrap();

    let report = scanner.scan().unwrap();
    let accepted: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(accepted, vec!["lib.rs", "notes.md"]);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_policy_missing_root_is_config_error() {
    let temp = TempDir::new().unwrap();
    let result = IgnorePolicy::build(&temp.path().join("missing"), &[]);
    assert!(matches!(result, Err(codesift_core::Error::Config(_))));
}

#[tokio::test]
async fn test_concurrent_scan_then_chunk() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for i in 0..12 {
        fs::write(
            root.join(format!("mod{:02}.go", i)),
            "line of code\n".repeat(50 + i),
        )
        .unwrap();
    }

    let report = default_scanner(root)
        .scan_concurrent(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.files.len(), 12);
    assert!(report.files.windows(2).all(|w| w[0].path < w[1].path));

    let chunker = Chunker::new(ChunkerConfig::new(100, 10)).with_workers(4);
    for (file, chunks) in report.files.iter().zip(chunker.chunk_files(&report.files)) {
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.file_path == file.path && c.start_line >= 1));
    }
}

#[test]
fn test_records_serialize_for_the_indexer() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.go"), "package main").unwrap();

    let report = default_scanner(temp.path()).scan().unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["files"][0]["path"], "main.go");
    assert_eq!(json["cancelled"], false);

    let chunks = Chunker::default().chunk("main.go", &report.files[0].content);
    let json = serde_json::to_value(&chunks).unwrap();
    assert_eq!(json[0]["id"], "main.go_0");
    assert_eq!(json[0]["start_line"], 1);
}
