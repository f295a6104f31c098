//! Windowed file reads.
use crate::error::{Result, WsgrepError};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 1-based, inclusive range of lines to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWindow {
    pub start_line: usize,
    /// Defaults to `start_line + max_lines - 1`.
    pub end_line: Option<usize>,
    pub max_lines: usize,
}

impl Default for LineWindow {
    fn default() -> Self {
        Self {
            start_line: 1,
            end_line: None,
            max_lines: Self::DEFAULT_MAX_LINES,
        }
    }
}

impl LineWindow {
    pub const DEFAULT_MAX_LINES: usize = 100;

    pub fn new(start_line: Option<usize>, end_line: Option<usize>, max_lines: usize) -> Self {
        Self {
            start_line: start_line.unwrap_or(1),
            end_line,
            max_lines,
        }
    }

    fn bounds(&self) -> Result<(usize, usize)> {
        let start = self.start_line.max(1);
        match self.end_line {
            Some(end) if end < start => Err(WsgrepError::InvalidLineRange { start, end }),
            Some(end) => Ok((start, end)),
            None if self.max_lines == 0 => Err(WsgrepError::InvalidLimit),
            None => Ok((start, start.saturating_add(self.max_lines - 1))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub start_line: usize,
    /// Clamped to `total_lines`; below `start_line` when the window lies
    /// past the end of the file.
    pub end_line: usize,
    pub total_lines: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReadResult {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<FileContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reads `window` from `root/relative`. `relative` must already have been
/// checked against the workspace.
pub fn read_file(root: &Path, relative: &str, window: &LineWindow) -> Result<FileContent> {
    let (start, end) = window.bounds()?;
    let bytes = fs::read(root.join(relative))?;
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    let total_lines = all.len();
    let end = end.min(total_lines);

    let lines = if start <= end {
        all[start - 1..end].iter().map(|l| l.to_string()).collect()
    } else {
        Vec::new()
    };

    Ok(FileContent {
        path: relative.to_string(),
        start_line: start,
        end_line: end,
        total_lines,
        lines,
    })
}

/// Reads several files, recording failures per file.
pub fn read_files(root: &Path, paths: &[String], window: &LineWindow) -> Vec<FileReadResult> {
    paths
        .iter()
        .map(|path| match read_file(root, path, window) {
            Ok(content) => FileReadResult {
                path: path.clone(),
                content: Some(content),
                error: None,
            },
            Err(e) => FileReadResult {
                path: path.clone(),
                content: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}
