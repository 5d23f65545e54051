//! Ignore policy for scanning
//!
//! Patterns follow a subset of `.gitignore` syntax:
//! - blank lines and `#` comments are skipped
//! - a trailing `/` restricts the pattern to directories
//! - a pattern without `/` matches any single path segment
//! - a pattern with `/` is anchored at the root; `*` stops at `/`, `**` does not
//!
//! Negations (`!pattern`) are not supported. Matching any rule excludes the
//! path, and a path under an excluded directory is excluded too.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::debug;

/// Ignore files read from the scan root by default
pub const DEFAULT_IGNORE_FILES: &[&str] = &[".gitignore"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    dir_only: bool,
    anchored: bool,
}

impl IgnoreRule {
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        if line.starts_with('!') {
            debug!(pattern = line, "Negated ignore patterns are not supported, dropping");
            return Ok(None);
        }

        let (body, dir_only) = match line.strip_suffix('/') {
            Some(body) => (body, true),
            None => (line, false),
        };
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Ok(None);
        }

        let pattern = Pattern::new(body)
            .map_err(|e| Error::Config(format!("invalid ignore pattern '{}': {}", line, e)))?;

        Ok(Some(Self {
            pattern,
            dir_only,
            anchored,
        }))
    }

    /// `prefix` is the path up to and including `segment`
    fn matches(&self, prefix: &str, segment: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            self.pattern.matches_with(prefix, MATCH_OPTIONS)
        } else {
            self.pattern.matches_with(segment, MATCH_OPTIONS)
        }
    }
}

/// Decides whether a root-relative path is excluded from scanning.
///
/// Built once per scan root and immutable afterwards, so it can be shared
/// between scanning workers.
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    rules: Vec<IgnoreRule>,
}

impl IgnorePolicy {
    /// Build from the default ignore files at `root` plus `extra_patterns`
    pub fn build(root: &Path, extra_patterns: &[String]) -> Result<Self> {
        let ignore_files: Vec<String> = DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect();
        Self::build_with_files(root, extra_patterns, &ignore_files)
    }

    /// Build from the named ignore files at `root` plus `extra_patterns`.
    ///
    /// Missing ignore files are fine; an unreadable one is a config error.
    pub fn build_with_files(
        root: &Path,
        extra_patterns: &[String],
        ignore_files: &[String],
    ) -> Result<Self> {
        if let Err(e) = std::fs::read_dir(root) {
            return Err(Error::Config(format!(
                "scan root {} is not accessible: {}",
                root.display(),
                e
            )));
        }

        let mut rules = Vec::new();

        for name in ignore_files {
            let path = root.join(name);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::Config(format!(
                        "failed to read ignore file {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            let before = rules.len();
            for line in content.lines() {
                rules.extend(IgnoreRule::parse(line)?);
            }
            debug!(file = %path.display(), rules = rules.len() - before, "Loaded ignore file");
        }

        for pattern in extra_patterns {
            rules.extend(IgnoreRule::parse(pattern)?);
        }

        Ok(Self { rules })
    }

    /// Build from patterns alone, without touching the filesystem
    pub fn from_patterns(patterns: &[String]) -> Result<Self> {
        let mut rules = Vec::new();
        for pattern in patterns {
            rules.extend(IgnoreRule::parse(pattern)?);
        }
        Ok(Self { rules })
    }

    /// True when the file at `relative_path` is excluded
    pub fn matches(&self, relative_path: &str) -> bool {
        self.is_excluded(relative_path, false)
    }

    /// True when the directory at `relative_path` is excluded
    pub fn matches_dir(&self, relative_path: &str) -> bool {
        self.is_excluded(relative_path, true)
    }

    pub fn pattern_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn is_excluded(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let normalized = relative_path.replace('\\', "/");
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let joined = segments.join("/");

        let mut end = 0;
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                end += 1;
            }
            end += segment.len();
            let prefix = &joined[..end];
            let segment_is_dir = i + 1 < segments.len() || is_dir;

            if self
                .rules
                .iter()
                .any(|rule| rule.matches(prefix, segment, segment_is_dir))
            {
                return true;
            }
        }

        false
    }
}
