//! Keyword matching against file base names.
use super::{MatchLine, SearchMode};
use crate::pattern::{base_name, normalize_path};

/// Case-insensitive substring matcher for base names.
#[derive(Debug, Clone)]
pub struct FilenameMatcher {
    keywords: Vec<String>,
    mode: SearchMode,
}

impl FilenameMatcher {
    pub fn new(keywords: &[String], mode: SearchMode) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            mode,
        }
    }

    /// Tests the base name of a normalized relative path. On a match the
    /// synthetic line `{ line_number: 0, content: base_name }` is returned.
    pub fn matches(&self, path: &str) -> Option<MatchLine> {
        let name = base_name(path);
        let folded = name.to_lowercase();
        let hit = match self.mode {
            SearchMode::And => self.keywords.iter().all(|k| folded.contains(k.as_str())),
            SearchMode::Or => self.keywords.iter().any(|k| folded.contains(k.as_str())),
        };
        (hit && !self.keywords.is_empty()).then(|| MatchLine::filename(name))
    }
}

pub fn scan_filename(path: &str, keywords: &[String], mode: SearchMode) -> Option<MatchLine> {
    FilenameMatcher::new(keywords, mode).matches(&normalize_path(path))
}
