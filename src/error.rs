use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsgrepError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("at least one keyword is required")]
    EmptyKeywords,

    #[error("keyword #{index} is blank")]
    BlankKeyword { index: usize },

    #[error("limit must be greater than zero")]
    InvalidLimit,

    #[error("search root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("path cannot be empty")]
    EmptyPath,

    #[error("path '{}' must be within workspace directory: {}", path.display(), workspace.display())]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("invalid commit reference: '{0}'")]
    InvalidRevision(String),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("end_line ({end}) must be >= start_line ({start})")]
    InvalidLineRange { start: usize, end: usize },

    #[error("search cancelled")]
    Cancelled,

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WsgrepError>;
