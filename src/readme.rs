//! README discovery inside a repository.
use crate::error::{Result, WsgrepError};
use crate::list::text_counts;
use crate::pattern::base_name;
use crate::walker::{CancelToken, Walker, METADATA_DIR};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadmeFile {
    /// Relative to the repository root.
    pub path: String,
    pub size: u64,
    pub line_count: usize,
    pub modified: Option<DateTime<Utc>>,
}

/// `README`, `readme.md`, `Readme.txt` and so on; `READMENOT.md` is not one.
pub fn is_readme(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower == "readme" || lower.starts_with("readme.")
}

/// README files of `root`, or of the whole tree when `recursive`, in walk order.
pub fn find_readmes(
    root: &Path,
    recursive: bool,
    cancel: Option<&CancelToken>,
) -> Result<Vec<ReadmeFile>> {
    if !root.is_dir() {
        return Err(WsgrepError::NotADirectory(root.to_path_buf()));
    }

    let mut found = Vec::new();
    if recursive {
        let mut walker = Walker::new(root, &[], &[]);
        if let Some(token) = cancel {
            walker = walker.with_cancel(token.clone());
        }
        for entry in walker.iter() {
            let entry = entry?;
            if is_readme(base_name(&entry.relative)) {
                push_readme(&mut found, &entry.path, entry.relative);
            }
        }
    } else {
        let mut children: Vec<_> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != METADATA_DIR)
            .collect();
        children.sort_by_key(|entry| entry.file_name());
        for child in children {
            let name = child.file_name().to_string_lossy().into_owned();
            let path = child.path();
            if is_readme(&name) && path.is_file() {
                push_readme(&mut found, &path, name);
            }
        }
    }
    Ok(found)
}

fn push_readme(found: &mut Vec<ReadmeFile>, path: &Path, relative: String) {
    match fs::metadata(path) {
        Ok(metadata) => found.push(ReadmeFile {
            path: relative,
            size: metadata.len(),
            line_count: text_counts(path).0,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }),
        Err(e) => debug!("Skipping {}: {}", path.display(), e),
    }
}
