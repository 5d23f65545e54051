//! Scan a source tree and print what an indexer would have to embed.
//!
//! Usage: cargo run --example index_tree -- <root> [previous-fingerprints.json]
//!
//! When a fingerprint file is given, only files changed since it was written
//! are chunked. The fresh fingerprints are written back to the same file.

use anyhow::{Context, Result};
use codesift_core::{plan_reindex, CancellationToken, Chunker, IndexConfig, TreeScanner};
use std::collections::HashMap;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let root = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let state_file = args.next().map(PathBuf::from);

    let config = IndexConfig::load()?;
    let scanner = TreeScanner::from_config(&root, &config.scan)?;
    let chunker = Chunker::new(config.chunker_config()).with_workers(config.scan.workers);

    let previous: HashMap<String, String> = match &state_file {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing fingerprint file")?
        }
        _ => HashMap::new(),
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = scanner.scan_concurrent(&cancel).await?;
    println!(
        "Scanned {}: {} files accepted, {} skipped{}",
        root.display(),
        report.files.len(),
        report.skipped.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    for skip in &report.skipped {
        println!("  skip {:<24} {}", skip.reason, skip.path);
    }

    let plan = plan_reindex(report, &previous, &chunker);
    for file in &plan.changed {
        println!(
            "  changed {} ({} chunks, {} tokens est.)",
            file.file.path,
            file.chunks.len(),
            codesift_core::estimate_tokens(&file.file.content)
        );
    }
    for path in &plan.removed {
        println!("  removed {}", path);
    }
    println!(
        "{} changed, {} unchanged, {} removed, {} chunks to embed",
        plan.changed.len(),
        plan.unchanged.len(),
        plan.removed.len(),
        plan.chunk_count()
    );

    if let Some(path) = state_file {
        if !plan.cancelled {
            let json = serde_json::to_string_pretty(plan.fingerprints())?;
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        }
    }

    Ok(())
}
