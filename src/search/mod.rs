//! Keyword search over a directory tree.
//!
//! A search is described by a [`SearchRequest`], executed by
//! [`engine::search`] and answered with a [`SearchOutcome`]. Requests carry
//! every resolved setting; nothing is read from global state.
pub mod assemble;
pub mod engine;
pub mod filename;

use crate::error::{Result, WsgrepError};
use crate::vcs::TrackedFiles;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub use engine::{search, search_many, search_with_cancel};

/// Boolean combination of multiple keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Every keyword must occur somewhere in the file.
    #[default]
    And,
    /// At least one keyword must occur.
    Or,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::And => write!(f, "AND"),
            SearchMode::Or => write!(f, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub line_number: usize,
    pub content: String,
}

/// A matching line. `line_number == 0` marks a filename-level match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLine {
    pub line_number: usize,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_before: Vec<ContextLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_after: Vec<ContextLine>,
}

impl MatchLine {
    pub fn filename(base_name: impl Into<String>) -> Self {
        Self {
            line_number: 0,
            content: base_name.into(),
            context_before: Vec::new(),
            context_after: Vec::new(),
        }
    }

    pub fn is_filename_match(&self) -> bool {
        self.line_number == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Content,
    Filename,
    Both,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchType::Content => "content match",
            MatchType::Filename => "filename match",
            MatchType::Both => "filename + content match",
        };
        f.write_str(label)
    }
}

/// One file in the result set. A path never appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Root-relative, `/`-separated.
    pub path: String,
    pub match_type: MatchType,
    pub lines: Vec<MatchLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub files_scanned: usize,
    pub binary_skipped: usize,
    pub unreadable_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub root: PathBuf,
    pub results: Vec<MatchResult>,
    /// More matching files existed than `limit` allowed.
    pub truncated: bool,
    pub stats: SearchStats,
}

/// Fully resolved parameters of one search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub root: PathBuf,
    pub keywords: Vec<String>,
    pub mode: SearchMode,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub context_lines: usize,
    pub include_filenames: bool,
    pub limit: usize,
    /// ASCII case folding for content; filename matching always folds case.
    pub ignore_case: bool,
    /// When present, only these root-relative paths are candidates.
    pub tracked: Option<TrackedFiles>,
}

impl SearchRequest {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(root: impl Into<PathBuf>, keywords: Vec<String>) -> Self {
        Self {
            root: root.into(),
            keywords,
            mode: SearchMode::default(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            context_lines: 0,
            include_filenames: false,
            limit: Self::DEFAULT_LIMIT,
            ignore_case: false,
            tracked: None,
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_includes(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_excludes(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn with_filenames(mut self, include: bool) -> Self {
        self.include_filenames = include;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_tracked(mut self, tracked: TrackedFiles) -> Self {
        self.tracked = Some(tracked);
        self
    }

    /// Rejects malformed requests before any traversal. Keywords come back
    /// trimmed and without duplicates, in their original order.
    pub fn validate(mut self) -> Result<Self> {
        if self.keywords.is_empty() {
            return Err(WsgrepError::EmptyKeywords);
        }
        let mut keywords: Vec<String> = Vec::with_capacity(self.keywords.len());
        for (index, keyword) in self.keywords.iter().enumerate() {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                return Err(WsgrepError::BlankKeyword { index });
            }
            if !keywords.iter().any(|k| k == keyword) {
                keywords.push(keyword.to_string());
            }
        }
        self.keywords = keywords;

        if self.limit == 0 {
            return Err(WsgrepError::InvalidLimit);
        }
        if !self.root.exists() {
            return Err(WsgrepError::RootNotFound(self.root));
        }
        if !self.root.is_dir() {
            return Err(WsgrepError::NotADirectory(self.root));
        }
        Ok(self)
    }
}
