use crate::error::{Result as WsgrepResult, WsgrepError};
use crate::list::ListRequest;
use crate::read::LineWindow;
use crate::search::{SearchMode, SearchRequest};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the working copies.
    pub workspace: Option<PathBuf>,

    pub search: SearchConfig,

    pub filters: FilterConfig,

    pub list: ListConfig,

    pub read: ReadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub context_lines: usize,
    pub limit: usize,
    pub include_filenames: bool,
    pub ignore_case: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::And,
            context_lines: 0,
            limit: SearchRequest::DEFAULT_LIMIT,
            include_filenames: false,
            ignore_case: false,
        }
    }
}

/// Patterns applied to every search and listing in addition to CLI flags.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub limit: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            limit: ListRequest::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    pub max_lines: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            max_lines: LineWindow::DEFAULT_MAX_LINES,
        }
    }
}

impl Config {
    /// Loads `explicit` if given, otherwise the first config file found in
    /// the standard locations. A broken file in a standard location is
    /// reported and ignored; a broken explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()));
        }
        match Self::find_config_path() {
            Some(path) => Ok(Self::from_file(&path).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            })),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> WsgrepResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WsgrepError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Limits must be positive; zero is never read as "unlimited".
    pub fn validate(&self) -> WsgrepResult<()> {
        let limits = [
            ("search.limit", self.search.limit),
            ("list.limit", self.list.limit),
            ("read.max_lines", self.read.max_lines),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(WsgrepError::Config(format!(
                    "{key} must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("wsgrep/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".wsgrep.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".wsgrep.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    /// CLI value, then config file, then `./workspace`.
    pub fn workspace_dir(&self, cli_value: Option<&Path>) -> PathBuf {
        cli_value
            .map(Path::to_path_buf)
            .or_else(|| self.workspace.clone())
            .unwrap_or_else(|| PathBuf::from(Workspace::DEFAULT_DIR))
    }
}
