//! Text and JSON formatter implementations
use crate::list::FileEntry;
use crate::output::{Formatter, Listing, RepositorySearch, SearchQuery};
use crate::read::FileReadResult;
use crate::readme::ReadmeFile;
use crate::search::{MatchLine, SearchOutcome};
use crate::vcs::{Branch, CommitLog, RepositoryInfo};
use byte_unit::{Byte, UnitType};
use colored::*;
use serde::Serialize;
use serde_json::json;
use std::path::Path;

const RULE_WIDTH: usize = 50;
const SHORT_RULE_WIDTH: usize = 30;

/// Human-readable size, e.g. `512 B` or `1.5 KiB`.
pub fn format_size(size: u64) -> String {
    if size < 1024 {
        return format!("{size} B");
    }
    let adjusted = Byte::from_u64(size).get_appropriate_unit(UnitType::Binary);
    format!("{:.1} {}", adjusted.get_value(), adjusted.get_unit())
}

/// Human-readable report layout.
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, text: &str, style: impl Fn(ColoredString) -> ColoredString) -> String {
        if self.use_color {
            style(text.normal()).to_string()
        } else {
            text.to_string()
        }
    }

    fn match_line(&self, out: &mut String, line: &MatchLine) {
        if line.is_filename_match() {
            out.push_str(&format!("   └─ Filename: {}\n", line.content));
            return;
        }
        for ctx in &line.context_before {
            out.push_str(&self.paint(&format!("      {} │ {}", ctx.line_number, ctx.content), |s| {
                s.dimmed()
            }));
            out.push('\n');
        }
        let label = self.paint(&format!("Line {}", line.line_number), |s| s.yellow());
        out.push_str(&format!("   └─ {label}: {}\n", line.content.trim()));
        for ctx in &line.context_after {
            out.push_str(&self.paint(&format!("      {} │ {}", ctx.line_number, ctx.content), |s| {
                s.dimmed()
            }));
            out.push('\n');
        }
    }

    fn entry(&self, entry: &FileEntry) -> String {
        if entry.is_dir {
            return self.paint(&format!("{}/", entry.path), |s| s.blue().bold());
        }
        let mut parts = Vec::new();
        if entry.size > 0 {
            parts.push(format_size(entry.size));
        }
        if entry.line_count > 0 {
            parts.push(format!("{}L", entry.line_count));
        }
        if parts.is_empty() {
            entry.path.clone()
        } else {
            format!("{} ({})", entry.path, parts.join(", "))
        }
    }
}

impl Formatter for TextFormatter {
    fn search(&self, query: &SearchQuery<'_>, outcome: &SearchOutcome) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Search Results for: {} ({} files found)\n",
            query.describe(),
            outcome.results.len()
        ));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        if outcome.results.is_empty() {
            out.push_str("No files found matching the specified keywords.\n");
            return out;
        }

        for (i, result) in outcome.results.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "{} [{}]\n",
                self.paint(&result.path, |s| s.green().bold()),
                result.match_type
            ));
            for line in &result.lines {
                self.match_line(&mut out, line);
            }
        }

        if outcome.truncated {
            out.push_str(&format!(
                "\n(Limited to {} results, more files matched)\n",
                outcome.results.len()
            ));
        }
        out
    }

    fn search_many(&self, query: &SearchQuery<'_>, results: &[RepositorySearch]) -> String {
        let mut out = String::new();
        for (i, repo) in results.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "Repository: {}\n",
                self.paint(&repo.repository, |s| s.cyan().bold())
            ));
            out.push_str(&"=".repeat(RULE_WIDTH));
            out.push('\n');
            match (&repo.outcome, &repo.error) {
                (Some(outcome), _) => out.push_str(&self.search(query, outcome)),
                (None, Some(error)) => {
                    out.push_str(&self.paint(&format!("Error: {error}"), |s| s.red()));
                    out.push('\n');
                }
                (None, None) => {}
            }
        }
        out
    }

    fn listing(&self, listing: &Listing<'_>) -> String {
        let mut out = String::new();
        let mode = if listing.recursive {
            "recursive"
        } else {
            "non-recursive"
        };
        let directory = if listing.directory.is_empty() {
            "."
        } else {
            listing.directory
        };
        out.push_str(&format!(
            "Files in '{}' ({}, {} files):\n",
            directory,
            mode,
            listing.entries.len()
        ));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');
        for entry in listing.entries {
            out.push_str(&self.entry(entry));
            out.push('\n');
        }
        if listing.truncated {
            out.push_str(&format!("\n(Limited to {} results)\n", listing.limit));
        }
        out
    }

    fn contents(&self, results: &[FileReadResult]) -> String {
        let mut out = String::new();
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match (&result.content, &result.error) {
                (Some(content), _) => {
                    out.push_str(&self.paint(
                        &format!(
                            "[{} L{}-{}/{}]",
                            content.path, content.start_line, content.end_line, content.total_lines
                        ),
                        |s| s.green(),
                    ));
                    out.push('\n');
                    for line in &content.lines {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                (None, error) => {
                    out.push_str(&self.paint(
                        &format!("[{} ERR:{}]", result.path, error.as_deref().unwrap_or("unknown")),
                        |s| s.red(),
                    ));
                    out.push('\n');
                }
            }
        }
        out
    }

    fn info(&self, info: &RepositoryInfo) -> String {
        let mut out = String::new();
        out.push_str(&format!("Repository: {}\n", info.path.display()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        out.push_str(&format!(
            "Branch: {}\n",
            info.current_branch.as_deref().unwrap_or("(detached)")
        ));
        if let Some(count) = info.commit_count {
            out.push_str(&format!("Commits: {count}\n"));
        }
        if let Some(last) = &info.last_commit {
            out.push_str(&format!("Updated: {last}\n"));
        }
        if let Some(remote) = &info.remote_url {
            out.push_str(&format!("Remote: {remote}\n"));
        }
        if let Some(license) = &info.license {
            out.push_str(&format!("License: {license}\n"));
        }
        if let Some(readme) = &info.readme {
            out.push_str("\n## README\n");
            out.push_str(&"-".repeat(SHORT_RULE_WIDTH));
            out.push('\n');
            out.push_str(readme);
            if !readme.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    fn branches(&self, branches: &[Branch], limited: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("Branches ({}):\n", branches.len()));
        out.push_str(&"-".repeat(SHORT_RULE_WIDTH));
        out.push('\n');
        for branch in branches {
            if branch.is_current {
                out.push_str(&self.paint(&format!("* {} (current)", branch.name), |s| {
                    s.green().bold()
                }));
                out.push('\n');
            } else {
                out.push_str(&format!("  {}\n", branch.name));
            }
        }
        if limited {
            out.push_str("\n(Results may be limited)\n");
        }
        out
    }

    fn commits(&self, log: &CommitLog, limit: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!("Commit History ({} commits):\n", log.commits.len()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        if log.commits.is_empty() {
            out.push_str("No commits found.\n");
            return out;
        }
        for commit in &log.commits {
            out.push_str(&self.paint(&format!("commit {}", commit.hash), |s| s.yellow()));
            out.push('\n');
            out.push_str(&format!("Author: {}\n", commit.author));
            out.push_str(&format!("Date:   {}\n", commit.date));
            out.push_str(&format!("\n    {}\n\n", commit.message));
        }
        if log.truncated {
            out.push_str(&format!("(Limited to {limit} commits)\n"));
        }
        out
    }

    fn commit_diff(&self, revision: &str, diff: &str) -> String {
        let mut out = format!("Diff for commit {revision}:\n");
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        out.push_str(diff);
        out
    }

    fn readmes(&self, readmes: &[ReadmeFile], recursive: bool) -> String {
        let scope = if recursive {
            "recursive search"
        } else {
            "root directory only"
        };
        let mut out = String::new();
        out.push_str(&format!("README Files ({}, {} found):\n", scope, readmes.len()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        if readmes.is_empty() {
            out.push_str("No README files found in the repository.\n");
            return out;
        }
        for readme in readmes {
            out.push_str(&self.paint(&readme.path, |s| s.green()));
            out.push('\n');
            if readme.size > 0 {
                out.push_str(&format!("   Size: {}", format_size(readme.size)));
                if readme.line_count > 0 {
                    out.push_str(&format!(" | Lines: {}", readme.line_count));
                }
                out.push('\n');
            }
            if let Some(modified) = readme.modified {
                out.push_str(&format!(
                    "   Modified: {}\n",
                    modified.format("%Y-%m-%d %H:%M:%S")
                ));
            }
            out.push('\n');
        }
        out
    }

    fn repositories(&self, workspace: &Path, names: &[String]) -> String {
        let mut out = String::new();
        out.push_str(&format!("Workspace Repositories ({}):\n", workspace.display()));
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
        if names.is_empty() {
            out.push_str("No repositories found in workspace.\n");
            return out;
        }
        for name in names {
            out.push_str(name);
            out.push('\n');
        }
        out.push_str(&format!("\nTotal: {} repositories\n", names.len()));
        out
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Pretty-printed JSON documents.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
}

impl Formatter for JsonFormatter {
    fn search(&self, query: &SearchQuery<'_>, outcome: &SearchOutcome) -> String {
        to_json(&json!({
            "query": query.describe(),
            "keywords": query.keywords,
            "mode": query.mode,
            "root": outcome.root,
            "total": outcome.results.len(),
            "truncated": outcome.truncated,
            "stats": outcome.stats,
            "results": outcome.results,
        }))
    }

    fn search_many(&self, query: &SearchQuery<'_>, results: &[RepositorySearch]) -> String {
        to_json(&json!({
            "query": query.describe(),
            "keywords": query.keywords,
            "mode": query.mode,
            "repositories": results,
        }))
    }

    fn listing(&self, listing: &Listing<'_>) -> String {
        to_json(&json!({
            "directory": listing.directory,
            "recursive": listing.recursive,
            "limit": listing.limit,
            "total": listing.entries.len(),
            "truncated": listing.truncated,
            "files": listing.entries,
        }))
    }

    fn contents(&self, results: &[FileReadResult]) -> String {
        to_json(results)
    }

    fn info(&self, info: &RepositoryInfo) -> String {
        to_json(info)
    }

    fn branches(&self, branches: &[Branch], limited: bool) -> String {
        to_json(&json!({
            "total": branches.len(),
            "limited": limited,
            "branches": branches,
        }))
    }

    fn commits(&self, log: &CommitLog, limit: usize) -> String {
        to_json(&json!({
            "total": log.commits.len(),
            "limit": limit,
            "truncated": log.truncated,
            "commits": log.commits,
        }))
    }

    fn commit_diff(&self, revision: &str, diff: &str) -> String {
        to_json(&json!({
            "commit": revision,
            "diff": diff,
        }))
    }

    fn readmes(&self, readmes: &[ReadmeFile], recursive: bool) -> String {
        to_json(&json!({
            "recursive": recursive,
            "total": readmes.len(),
            "files": readmes,
        }))
    }

    fn repositories(&self, workspace: &Path, names: &[String]) -> String {
        to_json(&json!({
            "workspace": workspace,
            "repositories": names,
        }))
    }

    fn name(&self) -> &str {
        "json"
    }
}
