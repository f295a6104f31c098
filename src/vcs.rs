//! Read-only access to version-control metadata.
//!
//! The search engine never calls into this module itself; callers use it to
//! decide whether a directory is a repository and, optionally, to restrict a
//! search to tracked files.

use crate::error::{Result, WsgrepError};
use crate::pattern::normalize_path;
use crate::walker::METADATA_DIR;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const README_PREVIEW_LINES: usize = 50;
const LICENSE_FILES: &[&str] = &[
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
    "LICENCE",
    "LICENCE.txt",
    "LICENCE.md",
];
const README_FILES: &[&str] = &["README.md", "README", "README.txt", "README.rst"];

pub const DEFAULT_COMMIT_LIMIT: usize = 20;
const FIELD_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';
const LOG_FORMAT: &str = "--format=%H%x1f%an <%ae>%x1f%cI%x1f%s%x1e";

/// Root-relative paths of files under version control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFiles {
    paths: HashSet<String>,
}

impl TrackedFiles {
    pub fn contains(&self, relative_path: &str) -> bool {
        self.paths.contains(relative_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TrackedFiles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter
                .into_iter()
                .map(|p| normalize_path(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

pub trait VersionControl {
    fn is_version_controlled(&self, root: &Path) -> bool;

    fn tracked_files(&self, root: &Path) -> Result<TrackedFiles>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryInfo {
    pub path: PathBuf,
    pub current_branch: Option<String>,
    pub commit_count: Option<u64>,
    pub last_commit: Option<String>,
    pub remote_url: Option<String>,
    pub license: Option<String>,
    pub readme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    /// Committer date, ISO 8601.
    pub date: String,
    /// Subject line.
    pub message: String,
}

/// Newest-first history, cut at the requested limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitLog {
    pub commits: Vec<Commit>,
    pub truncated: bool,
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git;

impl Git {
    fn run(&self, root: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let command = args.join(" ");
        let output = Command::new("git")
            .arg("-C")
            .arg(root)
            .args(args)
            .output()
            .map_err(|e| WsgrepError::Git {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(WsgrepError::Git {
                command,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Runs a command whose output is optional in a report.
    fn query(&self, root: &Path, args: &[&str]) -> Option<String> {
        match self.run(root, args) {
            Ok(stdout) => {
                let text = String::from_utf8_lossy(&stdout).trim().to_string();
                (!text.is_empty()).then_some(text)
            }
            Err(e) => {
                debug!("{e}");
                None
            }
        }
    }

    fn ensure_repository(&self, root: &Path) -> Result<()> {
        if self.is_version_controlled(root) {
            Ok(())
        } else {
            Err(WsgrepError::NotARepository(root.to_path_buf()))
        }
    }

    /// Gathers a best-effort summary; missing pieces are left as `None`.
    pub fn info(&self, root: &Path) -> Result<RepositoryInfo> {
        self.ensure_repository(root)?;
        Ok(RepositoryInfo {
            path: root.to_path_buf(),
            current_branch: self.query(root, &["branch", "--show-current"]),
            commit_count: self
                .query(root, &["rev-list", "--all", "--count"])
                .and_then(|count| count.parse().ok()),
            last_commit: self.query(root, &["log", "-1", "--format=%cI"]),
            remote_url: self.query(root, &["remote", "get-url", "origin"]),
            license: first_existing(root, LICENSE_FILES),
            readme: first_existing(root, README_FILES)
                .and_then(|name| readme_preview(&root.join(name))),
        })
    }

    pub fn branches(&self, root: &Path) -> Result<Vec<Branch>> {
        self.ensure_repository(root)?;
        let stdout = self.run(root, &["branch", "-a"])?;
        Ok(parse_branches(&String::from_utf8_lossy(&stdout)))
    }

    /// The `limit` most recent commits reachable from `HEAD`. A repository
    /// without commits yields an empty log.
    pub fn commits(&self, root: &Path, limit: usize) -> Result<CommitLog> {
        if limit == 0 {
            return Err(WsgrepError::InvalidLimit);
        }
        self.ensure_repository(root)?;
        if self
            .query(root, &["rev-parse", "--verify", "--quiet", "HEAD"])
            .is_none()
        {
            return Ok(CommitLog::default());
        }

        let count = limit.saturating_add(1).to_string();
        let stdout = self.run(root, &["log", "-n", &count, LOG_FORMAT])?;
        let mut commits = parse_log(&String::from_utf8_lossy(&stdout));
        let truncated = commits.len() > limit;
        commits.truncate(limit);
        Ok(CommitLog { commits, truncated })
    }

    /// Header and patch of one commit, as printed by `git show`.
    pub fn commit_diff(&self, root: &Path, revision: &str) -> Result<String> {
        let revision = revision.trim();
        if revision.is_empty() || revision.starts_with('-') {
            return Err(WsgrepError::InvalidRevision(revision.to_string()));
        }
        self.ensure_repository(root)?;
        let stdout = self.run(root, &["show", "--no-color", revision, "--"])?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl VersionControl for Git {
    /// A `.git` directory, or a `.git` file for linked worktrees.
    fn is_version_controlled(&self, root: &Path) -> bool {
        root.join(METADATA_DIR).exists()
    }

    fn tracked_files(&self, root: &Path) -> Result<TrackedFiles> {
        self.ensure_repository(root)?;
        let stdout = self.run(root, &["ls-files", "-z"])?;
        Ok(parse_ls_files(&stdout))
    }
}

fn parse_ls_files(stdout: &[u8]) -> TrackedFiles {
    stdout
        .split(|&b| b == 0)
        .map(String::from_utf8_lossy)
        .collect()
}

fn parse_branches(stdout: &str) -> Vec<Branch> {
    stdout
        .lines()
        .filter(|line| !line.contains(" -> "))
        .filter_map(|line| {
            let (is_current, name) = match line.trim_start().strip_prefix("* ") {
                Some(name) => (true, name),
                None => (false, line.trim_start()),
            };
            let name = name.trim();
            (!name.is_empty()).then(|| Branch {
                name: name.to_string(),
                is_current,
            })
        })
        .collect()
}

fn parse_log(stdout: &str) -> Vec<Commit> {
    stdout
        .split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut fields = record.splitn(4, FIELD_SEPARATOR);
            Some(Commit {
                hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                message: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn first_existing(root: &Path, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| root.join(name).is_file())
        .map(|name| name.to_string())
}

fn readme_preview(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    Some(
        text.lines()
            .take(README_PREVIEW_LINES)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
