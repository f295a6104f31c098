use crate::output::OutputFormat;
use crate::search::SearchMode;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the working copies
    #[clap(long, env = "WSGREP_WORKSPACE", global = true)]
    pub workspace: Option<PathBuf>,

    /// Configuration file, overriding the standard locations
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(long, value_parser, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[clap(long, value_parser, global = true)]
    pub log: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Include/exclude flags shared by `search` and `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only consider paths matching this glob (repeatable)
    #[clap(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Skip paths matching this glob; `dir/` and `dir/**` prune whole subtrees (repeatable)
    #[clap(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[clap(required = true)]
    pub keywords: Vec<String>,

    /// Repository to search; repeat to search several in parallel
    #[clap(long = "repo", value_name = "REPO", required = true)]
    pub repos: Vec<String>,

    /// `and` requires every keyword in a file, `or` any of them [default: from config, else and]
    #[clap(long, value_enum)]
    pub mode: Option<SearchMode>,

    #[clap(flatten)]
    pub filters: FilterArgs,

    /// Lines of context around each match
    #[clap(short = 'C', long)]
    pub context: Option<usize>,

    /// Also match keywords against file names
    #[clap(long, default_value_t = false)]
    pub filenames: bool,

    #[clap(short = 'i', long, default_value_t = false)]
    pub ignore_case: bool,

    /// Maximum number of files per repository
    #[clap(long)]
    pub limit: Option<usize>,

    /// Restrict the search to files tracked by git
    #[clap(long, default_value_t = false)]
    pub tracked_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    pub repo: String,

    /// Directory relative to the repository root
    pub directory: Option<String>,

    #[clap(short, long, default_value_t = false)]
    pub recursive: bool,

    #[clap(flatten)]
    pub filters: FilterArgs,

    #[clap(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search file contents (and optionally names) for keywords
    Search(SearchArgs),
    /// List files in a repository directory
    List(ListArgs),
    /// Print a window of lines from one or more files
    Read {
        repo: String,

        #[clap(required = true)]
        files: Vec<String>,

        /// First line, 1-based
        #[clap(long)]
        start: Option<usize>,

        /// Last line, inclusive
        #[clap(long)]
        end: Option<usize>,
    },
    /// Summarize a repository
    Info { repo: String },
    /// List local and remote branches
    Branches {
        repo: String,

        #[clap(long)]
        limit: Option<usize>,
    },
    /// Show recent commits, newest first
    Commits {
        repo: String,

        /// Number of commits [default: 20]
        #[clap(long)]
        limit: Option<usize>,
    },
    /// Show the header and patch of one commit
    Diff { repo: String, commit: String },
    /// Find README files in a repository
    Readmes {
        repo: String,

        /// Search sub-directories as well
        #[clap(short, long, default_value_t = false)]
        recursive: bool,
    },
    /// List repositories in the workspace
    Repos,
    /// Generate shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}
