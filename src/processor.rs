use crate::error::{Result, WsgrepError};
use crate::search::{ContextLine, MatchLine, SearchMode};
use aho_corasick::AhoCorasick;
use log::debug;
use std::fs::{self, File};
use std::io::Read;
use std::ops::Range;
use std::path::Path;

const BINARY_CHECK_SIZE: usize = 8000;

/// Returns true if the file has a NUL byte in its first 8000 bytes.
/// Unreadable files are reported as non-binary.
pub fn is_binary(path: &Path) -> bool {
    if let Ok(mut file) = File::open(path) {
        let mut buffer = vec![0u8; BINARY_CHECK_SIZE];
        if let Ok(n) = file.read(&mut buffer) {
            return looks_binary(&buffer[..n]);
        }
    }
    false
}

pub(crate) fn looks_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_CHECK_SIZE)];
    memchr::memchr(0, head).is_some()
}

/// Outcome of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentScan {
    Matched(Vec<MatchLine>),
    NoMatch,
    Binary,
    Unreadable,
}

/// Literal multi-keyword matcher shared by AND and OR modes.
///
/// Every line is scanned once for all keywords. The file qualifies when
/// all keywords were seen (AND) or any was (OR); the reported lines are
/// the lines containing at least one keyword, each listed once.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    automaton: AhoCorasick,
    keyword_count: usize,
    mode: SearchMode,
}

impl KeywordMatcher {
    /// `keywords` should be non-empty and free of duplicates, as produced
    /// by [`SearchRequest::validate`](crate::search::SearchRequest::validate).
    pub fn new(keywords: &[String], mode: SearchMode, ignore_case: bool) -> Result<Self> {
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(ignore_case)
            .build(keywords)
            .map_err(|e| WsgrepError::Other(format!("Failed to build keyword matcher: {e}")))?;
        Ok(Self {
            automaton,
            keyword_count: keywords.len(),
            mode,
        })
    }

    pub fn scan_file(&self, path: &Path, context_lines: usize) -> ContentScan {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", path.display(), e);
                return ContentScan::Unreadable;
            }
        };
        if looks_binary(&bytes) {
            debug!("Skipping binary file: {}", path.display());
            return ContentScan::Binary;
        }
        let text = String::from_utf8_lossy(&bytes);
        let lines = self.scan_text(&text, context_lines);
        if lines.is_empty() {
            ContentScan::NoMatch
        } else {
            ContentScan::Matched(lines)
        }
    }

    pub fn scan_text(&self, text: &str, context_lines: usize) -> Vec<MatchLine> {
        let lines: Vec<&str> = text.lines().collect();
        let mut seen = vec![false; self.keyword_count];
        let mut hit_indices = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let mut hit = false;
            for m in self.automaton.find_overlapping_iter(*line) {
                seen[m.pattern().as_usize()] = true;
                hit = true;
            }
            if hit {
                hit_indices.push(idx);
            }
        }

        let qualifies = match self.mode {
            SearchMode::And => seen.iter().all(|&s| s),
            SearchMode::Or => !hit_indices.is_empty(),
        };
        if !qualifies {
            return Vec::new();
        }

        hit_indices
            .into_iter()
            .map(|idx| {
                let before_start = idx.saturating_sub(context_lines);
                let after_end = (idx + context_lines + 1).min(lines.len());
                MatchLine {
                    line_number: idx + 1,
                    content: lines[idx].to_string(),
                    context_before: context(&lines, before_start..idx),
                    context_after: context(&lines, (idx + 1)..after_end),
                }
            })
            .collect()
    }
}

fn context(lines: &[&str], range: Range<usize>) -> Vec<ContextLine> {
    range
        .map(|idx| ContextLine {
            line_number: idx + 1,
            content: lines[idx].to_string(),
        })
        .collect()
}

/// Scans one file with case-sensitive matching. Binary and unreadable
/// files produce no lines.
pub fn scan_content(
    path: &Path,
    keywords: &[String],
    mode: SearchMode,
    context_lines: usize,
) -> Result<Vec<MatchLine>> {
    let matcher = KeywordMatcher::new(keywords, mode, false)?;
    Ok(match matcher.scan_file(path, context_lines) {
        ContentScan::Matched(lines) => lines,
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn keywords(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn line_numbers(lines: &[MatchLine]) -> Vec<usize> {
        lines.iter().map(|l| l.line_number).collect()
    }

    #[test]
    fn test_and_requires_every_keyword() {
        let text = "alpha\nbeta\ngamma\n";
        let matcher = KeywordMatcher::new(&keywords(&["alpha", "gamma"]), SearchMode::And, false)
            .unwrap();
        assert_eq!(line_numbers(&matcher.scan_text(text, 0)), vec![1, 3]);

        let matcher = KeywordMatcher::new(&keywords(&["alpha", "delta"]), SearchMode::And, false)
            .unwrap();
        assert!(matcher.scan_text(text, 0).is_empty());
    }

    #[test]
    fn test_or_reports_union_without_duplicates() {
        let text = "alpha beta\nnothing\nbeta\n";
        let matcher =
            KeywordMatcher::new(&keywords(&["alpha", "beta", "zeta"]), SearchMode::Or, false)
                .unwrap();
        assert_eq!(line_numbers(&matcher.scan_text(text, 0)), vec![1, 3]);
    }

    #[test]
    fn test_overlapping_keywords_are_all_seen() {
        let matcher =
            KeywordMatcher::new(&keywords(&["main", "ain"]), SearchMode::And, false).unwrap();
        assert_eq!(line_numbers(&matcher.scan_text("func main() {}", 0)), vec![1]);
    }

    #[test]
    fn test_context_is_attached_and_clipped() {
        let text = "one\ntwo\nthree\nfour\nfive";
        let matcher = KeywordMatcher::new(&keywords(&["three"]), SearchMode::And, false).unwrap();
        let lines = matcher.scan_text(text, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 3);
        assert_eq!(
            lines[0].context_before,
            vec![ContextLine {
                line_number: 2,
                content: "two".into()
            }]
        );
        assert_eq!(lines[0].context_after[0].line_number, 4);

        let matcher = KeywordMatcher::new(&keywords(&["one"]), SearchMode::And, false).unwrap();
        let lines = matcher.scan_text(text, 3);
        assert!(lines[0].context_before.is_empty());
        assert_eq!(lines[0].context_after.len(), 3);
    }

    #[test]
    fn test_case_folding_is_opt_in() {
        let text = "Hello World";
        let strict = KeywordMatcher::new(&keywords(&["hello"]), SearchMode::And, false).unwrap();
        assert!(strict.scan_text(text, 0).is_empty());
        let folded = KeywordMatcher::new(&keywords(&["hello"]), SearchMode::And, true).unwrap();
        assert_eq!(folded.scan_text(text, 0).len(), 1);
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let matcher = KeywordMatcher::new(&keywords(&["b"]), SearchMode::And, false).unwrap();
        let lines = matcher.scan_text("a\r\nb\r\n", 0);
        assert_eq!(lines[0].content, "b");
        assert_eq!(lines[0].line_number, 2);
    }

    #[test]
    fn test_binary_and_unreadable_files() {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("blob.bin");
        fs::write(&binary, b"main\0\x01\x02").unwrap();
        assert!(is_binary(&binary));

        let matcher = KeywordMatcher::new(&keywords(&["main"]), SearchMode::And, false).unwrap();
        assert_eq!(matcher.scan_file(&binary, 0), ContentScan::Binary);
        assert_eq!(
            matcher.scan_file(&dir.path().join("gone.txt"), 0),
            ContentScan::Unreadable
        );

        let text = dir.path().join("main.go");
        fs::write(&text, "package main\n").unwrap();
        assert!(!is_binary(&text));
        assert_eq!(
            line_numbers(&scan_content(&text, &keywords(&["main"]), SearchMode::And, 0).unwrap()),
            vec![1]
        );
        assert!(scan_content(&binary, &keywords(&["main"]), SearchMode::Or, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 main\n").unwrap();
        let lines = scan_content(&path, &keywords(&["main"]), SearchMode::And, 0).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].content.ends_with("main"));
    }
}
