//! Glob-style include/exclude rules evaluated against root-relative paths.
//!
//! Three pattern shapes are understood:
//!
//! * plain globs (`*.go`, `src/*.rs`, `test/*`), matched against the base
//!   name, the full path and, for patterns with a separator, every
//!   segment prefix of the path;
//! * directory-anchored patterns (`vendor/`), matching the directory and
//!   everything beneath it;
//! * recursive patterns (`vendor/**`, `**/test/**`, `vendor/**/*.go`) where
//!   `**` stands for zero or more path segments. Text glued to the `**`
//!   continues the file name, so `**.rs` behaves like `**/*.rs`.
//!
//! Paths are always relative to the search root and use `/` as separator.
//! Anchoring is segment-exact: `vendor/` never matches `vendor2/x`.

use globset::{GlobBuilder, GlobMatcher};

pub const SEPARATOR: char = '/';
const RECURSIVE: &str = "**";

/// Shape of a pattern string, decided purely from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    DirectoryAnchored,
    Recursive,
    Glob,
}

impl PatternKind {
    pub fn of(pattern: &str) -> Self {
        if pattern.contains(RECURSIVE) {
            PatternKind::Recursive
        } else if pattern.ends_with(SEPARATOR) {
            PatternKind::DirectoryAnchored
        } else {
            PatternKind::Glob
        }
    }
}

/// Returns true if `pattern` matches the root-relative `path`.
pub fn matches(pattern: &str, path: &str) -> bool {
    CompiledPattern::new(pattern).matches(&normalize_path(path))
}

/// Returns true if `patterns` is empty or any of them matches `path`.
pub fn matches_any(patterns: &[String], path: &str) -> bool {
    PatternSet::new(patterns).matches_any(&normalize_path(path))
}

/// Exclusion wins over inclusion; an empty include list admits everything.
pub fn should_include(path: &str, includes: &[String], excludes: &[String]) -> bool {
    PathFilter::new(includes, excludes).should_include(&normalize_path(path))
}

/// Converts a platform path string into the `/`-separated form used by the
/// matcher, without leading `./` or surrounding separators.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_matches(SEPARATOR).to_string()
}

pub(crate) fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Compiles a single-segment glob: `*` and `?` never cross a separator.
/// Malformed globs yield `None` and never match.
pub(crate) fn compile_glob(pattern: &str) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
    {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            log::debug!("Ignoring malformed pattern '{pattern}': {e}");
            None
        }
    }
}

pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Every strict segment prefix of `path`: `a`, `a/b` for `a/b/c`.
fn segment_prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(SEPARATOR).map(move |(idx, _)| &path[..idx])
}

/// `path` itself followed by every tail obtained by dropping leading segments.
fn segment_tails(path: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path).chain(path.match_indices(SEPARATOR).map(move |(idx, _)| &path[idx + 1..]))
}

/// A leading run of path segments: literal, or glob-matched segment by segment.
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    literal: String,
    segments: usize,
    glob: Option<GlobMatcher>,
}

impl Anchor {
    pub(crate) fn new(prefix: &str) -> Self {
        let literal = prefix.trim_matches(SEPARATOR).to_string();
        let segments = literal.split(SEPARATOR).count();
        let glob = if has_wildcard(&literal) {
            compile_glob(&literal)
        } else {
            None
        };
        Self {
            literal,
            segments,
            glob,
        }
    }

    /// If `path` starts with this anchor on a segment boundary, returns the
    /// remainder after it (empty when `path` is the anchor itself).
    pub(crate) fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let (head, rest) = match path.match_indices(SEPARATOR).nth(self.segments - 1) {
            Some((idx, _)) => (&path[..idx], &path[idx + 1..]),
            None if path.split(SEPARATOR).count() == self.segments => (path, ""),
            None => return None,
        };
        let matched = match &self.glob {
            Some(glob) => glob.is_match(head),
            None => !has_wildcard(&self.literal) && head == self.literal,
        };
        matched.then_some(rest)
    }
}

/// Matches any single path segment, literally or as a glob.
#[derive(Debug, Clone)]
pub(crate) struct SegmentMatcher {
    literal: String,
    glob: Option<GlobMatcher>,
}

impl SegmentMatcher {
    pub(crate) fn new(segment: &str) -> Self {
        let glob = if has_wildcard(segment) {
            compile_glob(segment)
        } else {
            None
        };
        Self {
            literal: segment.to_string(),
            glob,
        }
    }

    pub(crate) fn is_match(&self, segment: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(segment),
            None => segment == self.literal,
        }
    }

    pub(crate) fn any_segment(&self, path: &str) -> bool {
        path.split(SEPARATOR).any(|segment| self.is_match(segment))
    }
}

#[derive(Debug, Clone)]
enum Rule {
    /// `dir/` and `dir/**`: the anchor itself and everything beneath it.
    Anchored(Anchor),
    /// `prefix/**/suffix`
    Nested {
        prefix: Anchor,
        suffix: Box<CompiledPattern>,
    },
    /// `**/X/**`
    AnySegment(SegmentMatcher),
    /// `**/rest`
    AnyDepth(Box<CompiledPattern>),
    /// `**`
    Everything,
    Glob {
        glob: GlobMatcher,
        has_separator: bool,
    },
    Never,
}

/// A pattern string compiled once and evaluated against many paths.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    rule: Rule,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Self {
        let source = pattern.trim().replace('\\', "/");
        let rule = Self::compile(&source);
        Self { source, rule }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn compile(pattern: &str) -> Rule {
        if pattern.trim_matches(SEPARATOR).is_empty() {
            return Rule::Never;
        }
        match PatternKind::of(pattern) {
            PatternKind::DirectoryAnchored => Rule::Anchored(Anchor::new(pattern)),
            PatternKind::Recursive => Self::compile_recursive(pattern),
            PatternKind::Glob => match compile_glob(pattern) {
                Some(glob) => Rule::Glob {
                    glob,
                    has_separator: pattern.contains(SEPARATOR),
                },
                None => Rule::Never,
            },
        }
    }

    fn compile_recursive(pattern: &str) -> Rule {
        // A trailing separator on a recursive pattern still means "this directory".
        let owned;
        let pattern = if pattern.ends_with(SEPARATOR) {
            owned = format!("{pattern}{RECURSIVE}");
            owned.as_str()
        } else {
            pattern
        };

        let Some((before, after)) = pattern.split_once(RECURSIVE) else {
            return Rule::Never;
        };
        let prefix = before.trim_end_matches(SEPARATOR);
        // `**` glued to text (`src/**.rs`) reads as `src/**/*.rs`.
        let suffix = if after.is_empty() || after.starts_with(SEPARATOR) {
            after.trim_start_matches(SEPARATOR).to_string()
        } else {
            format!("*{after}")
        };

        match (prefix.is_empty(), suffix.is_empty()) {
            (true, true) => Rule::Everything,
            (false, true) => Rule::Anchored(Anchor::new(prefix)),
            (true, false) => match suffix.strip_suffix("/**") {
                Some(segment) if !segment.contains(SEPARATOR) && !segment.contains(RECURSIVE) => {
                    Rule::AnySegment(SegmentMatcher::new(segment))
                }
                _ => Rule::AnyDepth(Box::new(CompiledPattern::new(&suffix))),
            },
            (false, false) => Rule::Nested {
                prefix: Anchor::new(prefix),
                suffix: Box::new(CompiledPattern::new(&suffix)),
            },
        }
    }

    /// `path` must already be normalized (see [`normalize_path`]).
    pub fn matches(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        match &self.rule {
            Rule::Anchored(anchor) => anchor.strip(path).is_some(),
            Rule::Nested { prefix, suffix } => match prefix.strip(path) {
                Some(rest) if !rest.is_empty() => {
                    suffix.matches(rest)
                        || suffix.matches(base_name(rest))
                        || segment_tails(rest).skip(1).any(|tail| suffix.matches(tail))
                }
                _ => false,
            },
            Rule::AnySegment(segment) => segment.any_segment(path),
            Rule::AnyDepth(rest) => segment_tails(path).any(|tail| rest.matches(tail)),
            Rule::Everything => true,
            Rule::Glob {
                glob,
                has_separator,
            } => {
                glob.is_match(base_name(path))
                    || glob.is_match(path)
                    || (*has_separator && segment_prefixes(path).any(|prefix| glob.is_match(prefix)))
            }
            Rule::Never => false,
        }
    }
}

/// A list of compiled patterns; blank entries are dropped.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| CompiledPattern::new(p))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// An empty set is a no-op filter and matches everything.
    pub fn matches_any(&self, path: &str) -> bool {
        self.is_empty() || self.patterns.iter().any(|p| p.matches(path))
    }

    /// Like [`matches_any`](Self::matches_any) but an empty set matches nothing.
    pub fn excludes(&self, path: &str) -> bool {
        !self.is_empty() && self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Include/exclude pair applied to every candidate file.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    includes: PatternSet,
    excludes: PatternSet,
}

impl PathFilter {
    pub fn new(includes: &[String], excludes: &[String]) -> Self {
        Self {
            includes: PatternSet::new(includes),
            excludes: PatternSet::new(excludes),
        }
    }

    pub fn should_include(&self, path: &str) -> bool {
        !self.excludes.excludes(path) && self.includes.matches_any(path)
    }
}
