//! Rendering of operation results as text or JSON.
pub mod formats;

use crate::list::FileEntry;
use crate::read::FileReadResult;
use crate::readme::ReadmeFile;
use crate::search::{SearchMode, SearchOutcome};
use crate::vcs::{Branch, CommitLog, RepositoryInfo};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

pub use formats::{JsonFormatter, TextFormatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What was searched for, for headers.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    pub keywords: &'a [String],
    pub mode: SearchMode,
}

impl SearchQuery<'_> {
    pub fn describe(&self) -> String {
        self.keywords.join(&format!(" {} ", self.mode))
    }
}

/// Outcome of one repository within a cross-repository search.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySearch {
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SearchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A listing together with the parameters that produced it.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub directory: &'a str,
    pub recursive: bool,
    pub limit: usize,
    pub entries: &'a [FileEntry],
    pub truncated: bool,
}

pub trait Formatter {
    fn search(&self, query: &SearchQuery<'_>, outcome: &SearchOutcome) -> String;

    fn search_many(&self, query: &SearchQuery<'_>, results: &[RepositorySearch]) -> String;

    fn listing(&self, listing: &Listing<'_>) -> String;

    fn contents(&self, results: &[FileReadResult]) -> String;

    fn info(&self, info: &RepositoryInfo) -> String;

    fn branches(&self, branches: &[Branch], limited: bool) -> String;

    fn commits(&self, log: &CommitLog, limit: usize) -> String;

    fn commit_diff(&self, revision: &str, diff: &str) -> String;

    fn readmes(&self, readmes: &[ReadmeFile], recursive: bool) -> String;

    fn repositories(&self, workspace: &Path, names: &[String]) -> String;

    fn name(&self) -> &str;
}

/// Picks the formatter for `format`. Colour applies to text only and is
/// enabled when stdout is a terminal.
pub fn formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(is_terminal::is_terminal(
            &std::io::stdout(),
        ))),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_description() {
        let keywords = vec!["a".to_string(), "b".to_string()];
        let and = SearchQuery {
            keywords: &keywords,
            mode: SearchMode::And,
        };
        assert_eq!(and.describe(), "a AND b");
        let or = SearchQuery {
            keywords: &keywords,
            mode: SearchMode::Or,
        };
        assert_eq!(or.describe(), "a OR b");
    }

    #[test]
    fn test_formatter_selection() {
        assert_eq!(formatter(OutputFormat::Json).name(), "json");
        assert_eq!(formatter(OutputFormat::Text).name(), "text");
    }
}
