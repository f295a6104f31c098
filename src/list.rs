//! Directory listing inside a repository.
use crate::error::{Result, WsgrepError};
use crate::pattern::{normalize_path, PathFilter};
use crate::processor::looks_binary;
use crate::walker::{Walker, METADATA_DIR};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    /// Relative to the repository root.
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Zero for directories and binary files.
    pub line_count: usize,
    pub char_count: usize,
}

/// Entries of one listing; `truncated` is set when more entries existed
/// than the limit allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOutcome {
    pub entries: Vec<FileEntry>,
    pub truncated: bool,
}

impl ListOutcome {
    /// Appends `entry` unless `limit` entries are already held, in which
    /// case the outcome is marked truncated and false is returned.
    fn push(&mut self, entry: FileEntry, limit: usize) -> bool {
        if self.entries.len() >= limit {
            self.truncated = true;
            return false;
        }
        self.entries.push(entry);
        true
    }
}

#[derive(Debug, Clone)]
pub struct ListRequest {
    pub root: PathBuf,
    /// Sub-directory of `root` to list; the root itself when `None`.
    pub directory: Option<String>,
    pub recursive: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub limit: usize,
}

impl ListRequest {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directory: None,
            recursive: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            limit: Self::DEFAULT_LIMIT,
        }
    }

    fn target(&self) -> (PathBuf, String) {
        let relative = self
            .directory
            .as_deref()
            .map(normalize_path)
            .unwrap_or_default();
        let full = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&relative)
        };
        (full, relative)
    }
}

/// Lists entries under `request.root`, at most `request.limit` of them.
///
/// Non-recursive listings show direct children (directories included),
/// sorted by name. Recursive listings show files only, in walk order,
/// with excluded subtrees pruned.
pub fn list_files(request: &ListRequest) -> Result<ListOutcome> {
    if request.limit == 0 {
        return Err(WsgrepError::InvalidLimit);
    }
    let (target, relative_dir) = request.target();
    if !target.exists() {
        return Err(WsgrepError::RootNotFound(target));
    }
    if !target.is_dir() {
        return Err(WsgrepError::NotADirectory(target));
    }

    if request.recursive {
        list_recursive(request, &target)
    } else {
        list_direct(request, &target, &relative_dir)
    }
}

fn list_recursive(request: &ListRequest, target: &Path) -> Result<ListOutcome> {
    let walker = Walker::new(
        &request.root,
        &request.include_patterns,
        &request.exclude_patterns,
    )
    .starting_at(target);

    let mut outcome = ListOutcome::default();
    for entry in walker.iter() {
        let entry = entry?;
        match fs::metadata(&entry.path) {
            Ok(metadata) => {
                if !outcome.push(describe(&entry.path, entry.relative, &metadata), request.limit) {
                    break;
                }
            }
            Err(e) => debug!("Skipping {}: {}", entry.path.display(), e),
        }
    }
    Ok(outcome)
}

fn list_direct(request: &ListRequest, target: &Path, relative_dir: &str) -> Result<ListOutcome> {
    let filter = PathFilter::new(&request.include_patterns, &request.exclude_patterns);
    let mut children: Vec<_> = fs::read_dir(target)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() != METADATA_DIR)
        .collect();
    children.sort_by_key(|entry| entry.file_name());

    let mut outcome = ListOutcome::default();
    for child in children {
        let name = child.file_name().to_string_lossy().into_owned();
        let relative = if relative_dir.is_empty() {
            name
        } else {
            format!("{relative_dir}/{name}")
        };
        if !filter.should_include(&relative) {
            continue;
        }
        let path = child.path();
        match fs::metadata(&path) {
            Ok(metadata) => {
                if !outcome.push(describe(&path, relative, &metadata), request.limit) {
                    break;
                }
            }
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(outcome)
}

fn describe(path: &Path, relative: String, metadata: &Metadata) -> FileEntry {
    let (line_count, char_count) = if metadata.is_file() {
        text_counts(path)
    } else {
        (0, 0)
    };
    FileEntry {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: relative,
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        line_count,
        char_count,
    }
}

pub(crate) fn text_counts(path: &Path) -> (usize, usize) {
    match fs::read(path) {
        Ok(bytes) if !looks_binary(&bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            (text.lines().count(), text.chars().count())
        }
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        write(dir.path(), "README.md", "# title\nbody\n");
        write(dir.path(), "src/main.go", "package main\n");
        write(dir.path(), "src/util_test.go", "package main\n");
        write(dir.path(), "vendor/dep.go", "package dep\n");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main\n");
        dir
    }

    fn paths(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_direct_listing_includes_directories() {
        let dir = fixture();
        let outcome = list_files(&ListRequest::new(dir.path())).unwrap();
        assert!(!outcome.truncated);
        let entries = outcome.entries;
        assert_eq!(paths(&entries), vec!["README.md", "src", "vendor"]);
        assert!(entries[1].is_dir);
        assert_eq!(entries[0].line_count, 2);
        assert_eq!(entries[0].char_count, 13);
        assert!(entries[0].modified.is_some());
    }

    #[test]
    fn test_direct_listing_of_subdirectory_with_patterns() {
        let dir = fixture();
        let mut request = ListRequest::new(dir.path());
        request.directory = Some("src".into());
        request.exclude_patterns = vec!["*_test.go".into()];
        let entries = list_files(&request).unwrap().entries;
        assert_eq!(paths(&entries), vec!["src/main.go"]);
        assert_eq!(entries[0].name, "main.go");
    }

    #[test]
    fn test_recursive_listing_prunes_and_limits() {
        let dir = fixture();
        let mut request = ListRequest::new(dir.path());
        request.recursive = true;
        request.exclude_patterns = vec!["vendor/".into()];
        let entries = list_files(&request).unwrap().entries;
        assert_eq!(
            paths(&entries),
            vec!["README.md", "src/main.go", "src/util_test.go"]
        );

        request.limit = 2;
        let outcome = list_files(&request).unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert!(outcome.truncated);
    }

    #[test]
    fn test_limit_equal_to_entry_count_is_not_truncated() {
        let dir = fixture();
        let mut request = ListRequest::new(dir.path());
        request.limit = 3;
        let outcome = list_files(&request).unwrap();
        assert_eq!(outcome.entries.len(), 3);
        assert!(!outcome.truncated);

        request.recursive = true;
        request.limit = 4;
        let outcome = list_files(&request).unwrap();
        assert_eq!(outcome.entries.len(), 4);
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_recursive_subdirectory_paths_are_root_relative() {
        let dir = fixture();
        let mut request = ListRequest::new(dir.path());
        request.recursive = true;
        request.directory = Some("src".into());
        request.include_patterns = vec!["src/*.go".into()];
        let entries = list_files(&request).unwrap().entries;
        assert_eq!(paths(&entries), vec!["src/main.go", "src/util_test.go"]);
    }

    #[test]
    fn test_binary_files_have_no_counts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("blob.bin"), b"\0\0\0").unwrap();
        let entries = list_files(&ListRequest::new(dir.path())).unwrap().entries;
        assert_eq!(entries[0].size, 3);
        assert_eq!(entries[0].line_count, 0);
    }

    #[test]
    fn test_errors() {
        let dir = fixture();
        let mut request = ListRequest::new(dir.path());
        request.limit = 0;
        assert!(matches!(list_files(&request), Err(WsgrepError::InvalidLimit)));

        let mut request = ListRequest::new(dir.path());
        request.directory = Some("missing".into());
        assert!(matches!(
            list_files(&request),
            Err(WsgrepError::RootNotFound(_))
        ));

        request.directory = Some("README.md".into());
        assert!(matches!(
            list_files(&request),
            Err(WsgrepError::NotADirectory(_))
        ));
    }
}
