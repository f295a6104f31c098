use crate::error::{Result, WsgrepError};
use crate::pattern::{normalize_path, PathFilter};
use crate::prune::Pruner;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

/// Version-control metadata directory, never descended into.
pub const METADATA_DIR: &str = ".git";

/// Shared flag checked by walkers between entries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A regular file found under the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Root-relative, `/`-separated.
    pub relative: String,
}

/// Returns `path` relative to `root` in matcher form, or `None` if `path`
/// is not under `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| normalize_path(&rel.to_string_lossy()))
}

/// Depth-first, lexicographically ordered traversal of regular files.
///
/// Directories matched by an exclude pattern are pruned before they are
/// opened; files are then filtered with the full include/exclude rules.
/// Symbolic links are reported only when they point at a regular file and
/// are never followed into directories.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    start: Option<PathBuf>,
    filter: PathFilter,
    pruner: Pruner,
    cancel: Option<CancelToken>,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>, includes: &[String], excludes: &[String]) -> Self {
        Self {
            root: root.into(),
            start: None,
            filter: PathFilter::new(includes, excludes),
            pruner: Pruner::new(excludes),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Walks only the subtree at `dir` (which should lie under the root).
    /// Paths and patterns stay relative to the root.
    pub fn starting_at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a fresh traversal. Each call walks the tree again.
    pub fn iter(&self) -> Files<'_> {
        let root = self.root.clone();
        let pruner = &self.pruner;
        let inner = WalkDir::new(self.start.as_deref().unwrap_or(&self.root))
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
            .into_iter()
            .filter_entry(move |entry| keep_entry(&root, pruner, entry));
        Files {
            walker: self,
            inner: Box::new(inner),
            done: false,
        }
    }

    /// Collects every file path, failing only on cancellation.
    pub fn collect_files(&self) -> Result<Vec<WalkEntry>> {
        self.iter().collect()
    }
}

fn keep_entry(root: &Path, pruner: &Pruner, entry: &DirEntry) -> bool {
    if entry.file_name() == METADATA_DIR {
        return false;
    }
    if !entry.file_type().is_dir() || pruner.is_empty() {
        return true;
    }
    match relative_path(root, entry.path()) {
        Some(rel) if pruner.should_skip(&rel) => {
            debug!("Pruning directory: {rel}");
            false
        }
        _ => true,
    }
}

/// Iterator returned by [`Walker::iter`].
///
/// Unreadable entries are logged and skipped. Once the cancel token fires
/// the iterator yields a single [`WsgrepError::Cancelled`] and then ends.
pub struct Files<'a> {
    walker: &'a Walker,
    inner: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    done: bool,
}

impl Iterator for Files<'_> {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.walker.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                self.done = true;
                return Some(Err(WsgrepError::Cancelled));
            }

            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                if !entry.path().is_file() {
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            let Some(relative) = relative_path(&self.walker.root, entry.path()) else {
                continue;
            };
            if !self.walker.filter.should_include(&relative) {
                continue;
            }
            return Some(Ok(WalkEntry {
                path: entry.into_path(),
                relative,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn relatives(walker: &Walker) -> Vec<String> {
        walker
            .collect_files()
            .unwrap()
            .into_iter()
            .map(|e| e.relative)
            .collect()
    }

    #[test]
    fn test_walk_is_sorted_depth_first() {
        let dir = tempdir().unwrap();
        for rel in ["b.txt", "a/z.txt", "a/b/c.txt", "c/d.txt", "a.txt"] {
            touch(dir.path(), rel);
        }
        let walker = Walker::new(dir.path(), &[], &[]);
        assert_eq!(
            relatives(&walker),
            vec!["a/b/c.txt", "a/z.txt", "a.txt", "b.txt", "c/d.txt"]
        );
        // restartable
        assert_eq!(relatives(&walker).len(), 5);
    }

    #[test]
    fn test_metadata_dir_is_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".git/HEAD");
        touch(dir.path(), ".git/objects/ab/cdef");
        touch(dir.path(), "main.go");
        let walker = Walker::new(dir.path(), &[], &[]);
        assert_eq!(relatives(&walker), vec!["main.go"]);
    }

    #[test]
    fn test_excluded_directories_are_pruned_and_files_filtered() {
        let dir = tempdir().unwrap();
        for rel in [
            "main.go",
            "main_test.go",
            "vendor/dep.go",
            "vendor2/other.go",
            "web/node_modules/react/index.js",
            "web/app.js",
        ] {
            touch(dir.path(), rel);
        }
        let excludes = strings(&["vendor/", "**/node_modules/**", "*_test.go"]);
        let walker = Walker::new(dir.path(), &[], &excludes);
        assert_eq!(
            relatives(&walker),
            vec!["main.go", "vendor2/other.go", "web/app.js"]
        );
    }

    #[test]
    fn test_includes_restrict_files() {
        let dir = tempdir().unwrap();
        for rel in ["a.go", "b.rs", "sub/c.go"] {
            touch(dir.path(), rel);
        }
        let walker = Walker::new(dir.path(), &strings(&["*.go"]), &[]);
        assert_eq!(relatives(&walker), vec!["a.go", "sub/c.go"]);
    }

    #[test]
    fn test_entries_carry_absolute_paths() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "x/y.txt");
        let entries = Walker::new(dir.path(), &[], &[]).collect_files().unwrap();
        assert_eq!(entries[0].path, dir.path().join("x").join("y.txt"));
    }

    #[test]
    fn test_subtree_walk_keeps_root_relative_paths() {
        let dir = tempdir().unwrap();
        for rel in ["src/a.rs", "src/gen/b.rs", "docs/c.md"] {
            touch(dir.path(), rel);
        }
        let walker = Walker::new(dir.path(), &[], &strings(&["src/gen/"]))
            .starting_at(dir.path().join("src"));
        assert_eq!(relatives(&walker), vec!["src/a.rs"]);
    }

    #[test]
    fn test_cancelled_walk_reports_once() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "b.txt");
        let token = CancelToken::new();
        token.cancel();
        let walker = Walker::new(dir.path(), &[], &[]).with_cancel(token);
        let mut iter = walker.iter();
        assert!(matches!(iter.next(), Some(Err(WsgrepError::Cancelled))));
        assert!(iter.next().is_none());
        assert!(matches!(
            walker.collect_files(),
            Err(WsgrepError::Cancelled)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_to_files_are_reported_but_dirs_not_followed() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "real/file.txt");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link_dir")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("real/file.txt"),
            dir.path().join("link_file.txt"),
        )
        .unwrap();
        let walker = Walker::new(dir.path(), &[], &[]);
        assert_eq!(relatives(&walker), vec!["link_file.txt", "real/file.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/x.txt");
        std::os::unix::fs::symlink(dir.path().join("a/missing"), dir.path().join("a/broken"))
            .unwrap();
        let walker = Walker::new(dir.path(), &[], &[]);
        assert_eq!(relatives(&walker), vec!["a/x.txt"]);
        assert!(walker.collect_files().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_stop_the_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "locked/secret.txt");
        touch(dir.path(), "z/last.txt");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walker = Walker::new(dir.path(), &[], &[]);
        let found = walker.collect_files().map(|entries| {
            entries
                .into_iter()
                .map(|e| e.relative)
                .collect::<Vec<_>>()
        });
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(found.unwrap(), vec!["a.txt", "z/last.txt"]);
    }
}
