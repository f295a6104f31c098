//! Subtree pruning for exclude patterns.
//!
//! Consulted for directories only, before the walker descends. A pruned
//! directory is never opened, which is what keeps dependency caches and
//! build output from dominating traversal time. Files inside directories
//! that survive pruning are still filtered one by one by
//! [`PathFilter`](crate::pattern::PathFilter).

use crate::pattern::{
    base_name, compile_glob, has_wildcard, normalize_path, Anchor, PatternKind, SegmentMatcher,
    SEPARATOR,
};
use globset::GlobMatcher;

/// Returns true if the directory at `relative_dir` can be skipped entirely.
pub fn should_skip(relative_dir: &str, exclude_patterns: &[String]) -> bool {
    Pruner::new(exclude_patterns).should_skip(&normalize_path(relative_dir))
}

#[derive(Debug, Clone)]
enum PruneRule {
    /// `dir/` or `dir/**`: the directory and all of its descendants.
    Anchored(Anchor),
    /// `**/name/**`: any directory with that name, at any depth.
    AnySegment(SegmentMatcher),
    /// `name`: a directory with exactly this name.
    Name(String),
    /// `a/b/*`: directories at exactly this depth matching the glob.
    AtDepth { glob: GlobMatcher, segments: usize },
}

impl PruneRule {
    fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim().replace('\\', "/");
        if pattern.trim_matches(SEPARATOR).is_empty() {
            return None;
        }
        match PatternKind::of(&pattern) {
            PatternKind::DirectoryAnchored => Some(PruneRule::Anchored(Anchor::new(&pattern))),
            PatternKind::Recursive => {
                // `**/name/` is `**/name/**`.
                let trimmed = pattern.trim_end_matches(SEPARATOR);
                let body = if pattern.ends_with(SEPARATOR) && !trimmed.ends_with("**") {
                    format!("{trimmed}/**")
                } else {
                    trimmed.to_string()
                };
                if let Some(prefix) = body.strip_suffix("/**") {
                    if let Some(segment) = prefix.strip_prefix("**/") {
                        if !segment.contains(SEPARATOR) && !segment.contains("**") {
                            return Some(PruneRule::AnySegment(SegmentMatcher::new(segment)));
                        }
                        return None;
                    }
                    if !prefix.contains("**") {
                        return Some(PruneRule::Anchored(Anchor::new(prefix)));
                    }
                }
                None
            }
            PatternKind::Glob if !pattern.contains(SEPARATOR) => {
                (!has_wildcard(&pattern)).then(|| PruneRule::Name(pattern.clone()))
            }
            PatternKind::Glob => compile_glob(&pattern).map(|glob| PruneRule::AtDepth {
                glob,
                segments: pattern.split(SEPARATOR).count(),
            }),
        }
    }

    fn applies(&self, dir: &str) -> bool {
        match self {
            PruneRule::Anchored(anchor) => anchor.strip(dir).is_some(),
            PruneRule::AnySegment(segment) => segment.any_segment(dir),
            PruneRule::Name(name) => base_name(dir) == name,
            PruneRule::AtDepth { glob, segments } => {
                dir.split(SEPARATOR).count() == *segments && glob.is_match(dir)
            }
        }
    }
}

/// Exclude patterns compiled into directory-level rules.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    rules: Vec<PruneRule>,
}

impl Pruner {
    pub fn new(exclude_patterns: &[String]) -> Self {
        Self {
            rules: exclude_patterns
                .iter()
                .filter_map(|p| PruneRule::parse(p))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `relative_dir` must already be normalized.
    pub fn should_skip(&self, relative_dir: &str) -> bool {
        !relative_dir.is_empty() && self.rules.iter().any(|rule| rule.applies(relative_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern;

    fn excludes(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_directory_anchored_prunes_target_and_descendants() {
        let ex = excludes(&["vendor/"]);
        assert!(should_skip("vendor", &ex));
        assert!(should_skip("vendor/github.com", &ex));
        assert!(!should_skip("vendor2", &ex));
        assert!(!should_skip("src/vendor", &ex));
    }

    #[test]
    fn test_recursive_anchor_prunes_like_directory_anchor() {
        let ex = excludes(&["build/**"]);
        assert!(should_skip("build", &ex));
        assert!(should_skip("build/out", &ex));
        assert!(!should_skip("builder", &ex));
    }

    #[test]
    fn test_any_segment_prunes_at_every_depth() {
        let ex = excludes(&["**/node_modules/**"]);
        assert!(should_skip("node_modules", &ex));
        assert!(should_skip("web/app/node_modules", &ex));
        assert!(!should_skip("web/node_modules_backup", &ex));
    }

    #[test]
    fn test_any_segment_with_trailing_separator() {
        let ex = excludes(&["**/node_modules/"]);
        assert!(should_skip("node_modules", &ex));
        assert!(should_skip("web/node_modules", &ex));
        assert!(!should_skip("node_modules2", &ex));
        assert!(pattern::matches("**/node_modules/", "web/node_modules/react/index.js"));

        assert!(should_skip("build", &excludes(&["build/**/"])));
    }

    #[test]
    fn test_bare_name_is_exact_segment() {
        let ex = excludes(&["target"]);
        assert!(should_skip("target", &ex));
        assert!(should_skip("crates/core/target", &ex));
        assert!(!should_skip("targets", &ex));
        assert!(!should_skip("vendorfile", &excludes(&["vendor"])));
    }

    #[test]
    fn test_path_glob_prunes_only_at_exact_depth() {
        let ex = excludes(&["test/*"]);
        assert!(!should_skip("test", &ex));
        assert!(should_skip("test/fixtures", &ex));
        assert!(!should_skip("pkg/test/fixtures", &ex));

        let ex = excludes(&["a/b/*"]);
        assert!(should_skip("a/b/c", &ex));
        assert!(!should_skip("a/b", &ex));
        assert!(!should_skip("a/x/c", &ex));
    }

    #[test]
    fn test_file_globs_never_prune() {
        let ex = excludes(&["*.go", "*_test.go", "**/*.md", "src/**/gen/*.rs"]);
        assert!(!should_skip("cmd", &ex));
        assert!(!should_skip("docs", &ex));
        assert!(!should_skip("src/gen", &ex));
    }

    #[test]
    fn test_pruning_agrees_with_file_matching_for_anchored_forms() {
        for pattern in ["vendor/", "vendor/**", "**/vendor/**", "**/vendor/", "test/*"] {
            let ex = excludes(&[pattern]);
            for dir in ["vendor", "vendor/x", "test/a", "a/vendor"] {
                if should_skip(dir, &ex) {
                    let file = format!("{dir}/file.go");
                    assert!(
                        pattern::matches(pattern, &file),
                        "{pattern} pruned {dir} but does not exclude {file}"
                    );
                }
            }
        }
    }
}
