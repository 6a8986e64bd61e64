//! Recursive directory traversal.
//!
//! Depth-first walk over a root directory with two skip rules per entry: a
//! glob match against the basename, or plain substring containment in the
//! full path. Either match skips the entry, and a skipped directory prunes
//! its whole subtree. Permission-denied errors on individual entries are
//! swallowed; any other I/O error aborts the walk. A shared visit counter
//! enforces the cumulative entry cap across multiple roots.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::RecallerError;

/// Compiled ignore rules: basename globs plus raw substring patterns.
pub struct IgnoreRules {
    globs: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(patterns: &[String]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            globs: builder.build()?,
            patterns: patterns.to_vec(),
        })
    }

    /// True when the entry should be skipped: its basename matches a glob,
    /// or any pattern appears as a substring of the full path.
    pub fn matches(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name() {
            if self.globs.is_match(Path::new(name)) {
                return true;
            }
        }

        let path_str = path.to_string_lossy();
        self.patterns.iter().any(|p| path_str.contains(p.as_str()))
    }
}

/// Walk `root`, invoking `visit` for every non-skipped entry (files and
/// directories alike). `visited` accumulates across calls so a multi-root
/// indexing run shares one budget; crossing `limit` stops the walk with
/// [`RecallerError::LimitReached`].
pub fn walk<F>(
    root: &Path,
    rules: &IgnoreRules,
    limit: usize,
    visited: &mut usize,
    mut visit: F,
) -> Result<(), RecallerError>
where
    F: FnMut(&Path),
{
    let mut entries = WalkDir::new(root).into_iter();

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let denied = err
                    .io_error()
                    .map(|io| io.kind() == std::io::ErrorKind::PermissionDenied)
                    .unwrap_or(false);
                if denied {
                    continue;
                }
                return Err(RecallerError::Io(err.into()));
            }
        };

        if rules.matches(entry.path()) {
            if entry.file_type().is_dir() {
                entries.skip_current_dir();
            }
            continue;
        }

        if *visited >= limit {
            return Err(RecallerError::LimitReached(limit));
        }

        visit(entry.path());
        *visited += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn default_rules() -> IgnoreRules {
        IgnoreRules::new(&[
            "node_modules".to_string(),
            ".git".to_string(),
            "*.tmp".to_string(),
            "*.log".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn glob_patterns_match_basenames() {
        let rules = default_rules();
        assert!(rules.matches(Path::new("/work/build/output.tmp")));
        assert!(rules.matches(Path::new("/work/app.log")));
        assert!(!rules.matches(Path::new("/work/app.rs")));
    }

    #[test]
    fn substring_patterns_match_anywhere_in_the_path() {
        let rules = default_rules();
        assert!(rules.matches(Path::new("/repo/node_modules/pkg/index.js")));
        assert!(rules.matches(Path::new("/repo/.git/HEAD")));
    }

    #[test]
    fn walk_skips_ignored_subtrees() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/dep.js"), "x").unwrap();
        fs::write(root.join("scratch.tmp"), "x").unwrap();

        let rules = default_rules();
        let mut seen = Vec::new();
        let mut visited = 0;
        walk(root, &rules, 1000, &mut visited, |path| {
            seen.push(path.to_path_buf());
        })
        .unwrap();

        assert!(seen.iter().any(|p| p.ends_with("src/main.rs")));
        assert!(!seen.iter().any(|p| p.to_string_lossy().contains("node_modules")));
        assert!(!seen.iter().any(|p| p.ends_with("scratch.tmp")));
        assert_eq!(visited, seen.len());
    }

    #[test]
    fn walk_stops_at_the_entry_cap() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..20 {
            fs::write(tmp.path().join(format!("file-{i:02}.txt")), "x").unwrap();
        }

        let rules = IgnoreRules::new(&[]).unwrap();
        let mut visited = 0;
        let err = walk(tmp.path(), &rules, 5, &mut visited, |_| {}).unwrap_err();

        assert!(matches!(err, RecallerError::LimitReached(5)));
        assert_eq!(visited, 5);
    }

    #[test]
    fn budget_is_shared_across_roots() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for i in 0..4 {
            fs::write(a.path().join(format!("a{i}")), "x").unwrap();
            fs::write(b.path().join(format!("b{i}")), "x").unwrap();
        }

        let rules = IgnoreRules::new(&[]).unwrap();
        let mut visited = 0;
        walk(a.path(), &rules, 8, &mut visited, |_| {}).unwrap();
        let err = walk(b.path(), &rules, 8, &mut visited, |_| {}).unwrap_err();
        assert!(matches!(err, RecallerError::LimitReached(8)));
    }
}
