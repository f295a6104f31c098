//! Search entry points.
use super::assemble::{assemble, Hit};
use super::filename::FilenameMatcher;
use super::{SearchOutcome, SearchRequest, SearchStats};
use crate::error::Result;
use crate::processor::{ContentScan, KeywordMatcher};
use crate::walker::{CancelToken, Walker};
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

/// Runs one search to completion.
pub fn search(request: SearchRequest) -> Result<SearchOutcome> {
    search_with_cancel(request, None)
}

/// Like [`search`], aborting with [`Cancelled`](crate::error::WsgrepError::Cancelled)
/// between directory entries once `cancel` fires.
pub fn search_with_cancel(
    request: SearchRequest,
    cancel: Option<&CancelToken>,
) -> Result<SearchOutcome> {
    let start = Instant::now();
    let request = request.validate()?;
    let matcher = KeywordMatcher::new(&request.keywords, request.mode, request.ignore_case)?;
    let filename_matcher = request
        .include_filenames
        .then(|| FilenameMatcher::new(&request.keywords, request.mode));

    let mut walker = Walker::new(
        &request.root,
        &request.include_patterns,
        &request.exclude_patterns,
    );
    if let Some(token) = cancel {
        walker = walker.with_cancel(token.clone());
    }

    let mut stats = SearchStats::default();
    let mut content_hits = Vec::new();
    let mut filename_hits = Vec::new();
    let mut matched_paths = 0usize;

    for (ordinal, entry) in walker.iter().enumerate() {
        let entry = entry?;
        if let Some(tracked) = &request.tracked {
            if !tracked.contains(&entry.relative) {
                continue;
            }
        }

        let mut matched = false;
        match matcher.scan_file(&entry.path, request.context_lines) {
            ContentScan::Matched(lines) => {
                stats.files_scanned += 1;
                content_hits.push(Hit::new(ordinal, entry.relative.clone(), lines));
                matched = true;
            }
            ContentScan::NoMatch => stats.files_scanned += 1,
            ContentScan::Binary => stats.binary_skipped += 1,
            ContentScan::Unreadable => stats.unreadable_skipped += 1,
        }
        if let Some(line) = filename_matcher
            .as_ref()
            .and_then(|m| m.matches(&entry.relative))
        {
            filename_hits.push(Hit::new(ordinal, entry.relative, vec![line]));
            matched = true;
        }

        if matched {
            matched_paths += 1;
            // One past the limit is enough to know the result is truncated.
            if matched_paths > request.limit {
                debug!("Result limit {} reached, stopping traversal", request.limit);
                break;
            }
        }
    }

    let (results, truncated) = assemble(content_hits, filename_hits, request.limit);
    info!(
        "Searched {} ({} files scanned, {} binary, {} unreadable): {} result(s){} in {:.2?}",
        request.root.display(),
        stats.files_scanned,
        stats.binary_skipped,
        stats.unreadable_skipped,
        results.len(),
        if truncated { ", truncated" } else { "" },
        start.elapsed()
    );

    Ok(SearchOutcome {
        root: request.root,
        results,
        truncated,
        stats,
    })
}

/// Runs independent searches in parallel. Results are returned in the
/// order of `requests`.
pub fn search_many(requests: Vec<SearchRequest>) -> Vec<Result<SearchOutcome>> {
    search_many_with_cancel(requests, None)
}

pub fn search_many_with_cancel(
    requests: Vec<SearchRequest>,
    cancel: Option<&CancelToken>,
) -> Vec<Result<SearchOutcome>> {
    requests
        .into_par_iter()
        .map(|request| search_with_cancel(request, cancel))
        .collect()
}
