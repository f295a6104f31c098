//! Merging of content and filename hits into the final result set.
use super::{MatchLine, MatchResult, MatchType};
use std::collections::HashMap;

/// Per-path hit from one scanner. `ordinal` is the walk position of the
/// path and fixes its place in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub ordinal: usize,
    pub path: String,
    pub lines: Vec<MatchLine>,
}

impl Hit {
    pub fn new(ordinal: usize, path: impl Into<String>, lines: Vec<MatchLine>) -> Self {
        Self {
            ordinal,
            path: path.into(),
            lines,
        }
    }
}

#[derive(Default)]
struct Pending {
    ordinal: usize,
    path: String,
    content: Option<Vec<MatchLine>>,
    filename: Option<Vec<MatchLine>>,
}

impl Pending {
    fn into_result(self) -> MatchResult {
        let match_type = match (&self.content, &self.filename) {
            (Some(_), Some(_)) => MatchType::Both,
            (None, Some(_)) => MatchType::Filename,
            _ => MatchType::Content,
        };
        let mut lines = self.content.unwrap_or_default();
        lines.extend(self.filename.unwrap_or_default());
        MatchResult {
            path: self.path,
            match_type,
            lines,
        }
    }
}

/// Groups hits by path in walk order. A path present in both streams
/// becomes a single [`MatchType::Both`] result with its content lines first.
/// Whole results beyond `limit` are dropped; the flag reports whether any were.
pub fn assemble(
    content_hits: Vec<Hit>,
    filename_hits: Vec<Hit>,
    limit: usize,
) -> (Vec<MatchResult>, bool) {
    let mut pending: Vec<Pending> = Vec::with_capacity(content_hits.len() + filename_hits.len());
    let mut by_path: HashMap<String, usize> = HashMap::new();

    let tagged = content_hits
        .into_iter()
        .map(|hit| (hit, true))
        .chain(filename_hits.into_iter().map(|hit| (hit, false)));

    for (hit, is_content) in tagged {
        let idx = match by_path.get(&hit.path).copied() {
            Some(idx) => idx,
            None => {
                by_path.insert(hit.path.clone(), pending.len());
                pending.push(Pending {
                    ordinal: hit.ordinal,
                    path: hit.path.clone(),
                    ..Pending::default()
                });
                pending.len() - 1
            }
        };
        let slot = &mut pending[idx];
        slot.ordinal = slot.ordinal.min(hit.ordinal);
        let target = if is_content {
            &mut slot.content
        } else {
            &mut slot.filename
        };
        target.get_or_insert_with(Vec::new).extend(hit.lines);
    }

    pending.sort_by_key(|p| p.ordinal);
    let truncated = pending.len() > limit;
    pending.truncate(limit);
    (pending.into_iter().map(Pending::into_result).collect(), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, text: &str) -> MatchLine {
        MatchLine {
            line_number: n,
            content: text.to_string(),
            context_before: Vec::new(),
            context_after: Vec::new(),
        }
    }

    #[test]
    fn test_merges_both_streams() {
        let content = vec![Hit::new(0, "main.go", vec![line(1, "package main")])];
        let filenames = vec![Hit::new(0, "main.go", vec![MatchLine::filename("main.go")])];
        let (results, truncated) = assemble(content, filenames, 10);
        assert!(!truncated);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Both);
        assert_eq!(results[0].lines[0].line_number, 1);
        assert!(results[0].lines[1].is_filename_match());
    }

    #[test]
    fn test_keeps_walk_order_and_single_stream_types() {
        let content = vec![
            Hit::new(1, "b.go", vec![line(2, "x")]),
            Hit::new(3, "d.go", vec![line(1, "x")]),
        ];
        let filenames = vec![
            Hit::new(0, "a_x.txt", vec![MatchLine::filename("a_x.txt")]),
            Hit::new(2, "c_x.txt", vec![MatchLine::filename("c_x.txt")]),
        ];
        let (results, _) = assemble(content, filenames, 10);
        let paths: Vec<_> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a_x.txt", "b.go", "c_x.txt", "d.go"]);
        assert_eq!(results[0].match_type, MatchType::Filename);
        assert_eq!(results[1].match_type, MatchType::Content);
    }

    #[test]
    fn test_truncation_keeps_whole_results() {
        let content = (0..5)
            .map(|i| Hit::new(i, format!("f{i}.txt"), vec![line(1, "a"), line(2, "a")]))
            .collect();
        let (results, truncated) = assemble(content, Vec::new(), 3);
        assert!(truncated);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.lines.len() == 2));

        let content = (0..3)
            .map(|i| Hit::new(i, format!("f{i}.txt"), vec![line(1, "a")]))
            .collect();
        let (results, truncated) = assemble(content, Vec::new(), 3);
        assert!(!truncated);
        assert_eq!(results.len(), 3);
    }
}
