//! Keyword search, listing and reading over working copies kept in a
//! workspace directory.
//!
//! The core is the search engine: [`pattern`] decides which paths are
//! eligible, [`prune`] skips excluded subtrees, [`walker`] traverses the
//! tree in a stable order, [`processor`] and [`search::filename`] find
//! matches and [`search::assemble`] merges them into a bounded result set.
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod list;
pub mod output;
pub mod pattern;
pub mod processor;
pub mod prune;
pub mod read;
pub mod readme;
pub mod search;
pub mod vcs;
pub mod walker;
pub mod workspace;

pub use crate::error::{Result, WsgrepError};
pub use cli::{Cli, Commands};
pub use pattern::{matches, matches_any, should_include};
pub use prune::should_skip;
pub use search::{
    search, search_many, search_with_cancel, MatchLine, MatchResult, MatchType, SearchMode,
    SearchOutcome, SearchRequest,
};
pub use walker::{CancelToken, Walker};
pub use workspace::{PathGuard, Workspace};
