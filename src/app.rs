//! Command handling on top of the library operations
use crate::cli::{Cli, Commands, FilterArgs, ListArgs, SearchArgs};
use crate::config::Config;
use crate::error::{Result, WsgrepError};
use crate::list::{list_files, ListRequest};
use crate::output::{formatter, Formatter, Listing, RepositorySearch, SearchQuery};
use crate::read::{read_files, FileReadResult, LineWindow};
use crate::readme::find_readmes;
use crate::search::{engine, SearchRequest};
use crate::vcs::{Git, VersionControl, DEFAULT_COMMIT_LIMIT};
use crate::walker::CancelToken;
use crate::workspace::{PathGuard, Workspace};
use log::info;

/// Resolved configuration, workspace and output format for one invocation.
pub struct WsgrepApp {
    config: Config,
    workspace: Workspace,
    git: Git,
    formatter: Box<dyn Formatter>,
    cancel: CancelToken,
}

impl WsgrepApp {
    pub fn new(cli: &Cli, cancel: CancelToken) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let workspace = Workspace::new(config.workspace_dir(cli.workspace.as_deref()))?;
        Ok(Self {
            config,
            workspace,
            git: Git,
            formatter: formatter(cli.format),
            cancel,
        })
    }

    /// Runs `command` and returns the rendered output.
    pub fn run(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Search(args) => self.handle_search(args),
            Commands::List(args) => self.handle_list(args),
            Commands::Read {
                repo,
                files,
                start,
                end,
            } => self.handle_read(repo, files, *start, *end),
            Commands::Info { repo } => {
                let root = self.workspace.validate(repo)?;
                Ok(self.formatter.info(&self.git.info(&root)?))
            }
            Commands::Branches { repo, limit } => self.handle_branches(repo, *limit),
            Commands::Commits { repo, limit } => {
                let root = self.workspace.validate(repo)?;
                let limit = limit.unwrap_or(DEFAULT_COMMIT_LIMIT);
                Ok(self.formatter.commits(&self.git.commits(&root, limit)?, limit))
            }
            Commands::Diff { repo, commit } => {
                let root = self.workspace.validate(repo)?;
                let diff = self.git.commit_diff(&root, commit)?;
                Ok(self.formatter.commit_diff(commit.trim(), &diff))
            }
            Commands::Readmes { repo, recursive } => {
                let root = self.workspace.validate(repo)?;
                let readmes = find_readmes(&root, *recursive, Some(&self.cancel))?;
                Ok(self.formatter.readmes(&readmes, *recursive))
            }
            Commands::Repos => {
                let names = self.workspace.list_repositories(&self.git)?;
                Ok(self.formatter.repositories(self.workspace.root(), &names))
            }
            Commands::Completions { .. } => Err(WsgrepError::Other(
                "completions are generated by the binary".to_string(),
            )),
        }
    }

    fn patterns(&self, filters: &FilterArgs) -> (Vec<String>, Vec<String>) {
        let mut include = self.config.filters.include.clone();
        include.extend(filters.include.iter().cloned());
        let mut exclude = self.config.filters.exclude.clone();
        exclude.extend(filters.exclude.iter().cloned());
        (include, exclude)
    }

    fn search_request(&self, repo: &str, args: &SearchArgs) -> Result<SearchRequest> {
        let root = self.workspace.validate(repo)?;
        let (include, exclude) = self.patterns(&args.filters);
        let defaults = &self.config.search;
        let mode = args.mode.unwrap_or(defaults.mode);

        let mut request = SearchRequest::new(&root, args.keywords.clone())
            .with_mode(mode)
            .with_includes(include)
            .with_excludes(exclude)
            .with_context_lines(args.context.unwrap_or(defaults.context_lines))
            .with_filenames(args.filenames || defaults.include_filenames)
            .with_ignore_case(args.ignore_case || defaults.ignore_case)
            .with_limit(args.limit.unwrap_or(defaults.limit));
        if args.tracked_only {
            request = request.with_tracked(self.git.tracked_files(&root)?);
        }
        Ok(request)
    }

    fn handle_search(&self, args: &SearchArgs) -> Result<String> {
        let mode = args.mode.unwrap_or(self.config.search.mode);
        let query = SearchQuery {
            keywords: &args.keywords,
            mode,
        };

        if let [repo] = args.repos.as_slice() {
            let request = self.search_request(repo, args)?;
            let outcome = engine::search_with_cancel(request, Some(&self.cancel))?;
            return Ok(self.formatter.search(&query, &outcome));
        }

        let mut reports = Vec::with_capacity(args.repos.len());
        let mut slots = Vec::new();
        let mut requests = Vec::new();
        for repo in &args.repos {
            let mut report = RepositorySearch {
                repository: repo.clone(),
                outcome: None,
                error: None,
            };
            match self.search_request(repo, args) {
                Ok(request) => {
                    slots.push(reports.len());
                    requests.push(request);
                }
                Err(e) => report.error = Some(e.to_string()),
            }
            reports.push(report);
        }

        info!("Searching {} repositories in parallel", requests.len());
        let outcomes = engine::search_many_with_cancel(requests, Some(&self.cancel));
        for (slot, outcome) in slots.into_iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => reports[slot].outcome = Some(outcome),
                Err(WsgrepError::Cancelled) => return Err(WsgrepError::Cancelled),
                Err(e) => reports[slot].error = Some(e.to_string()),
            }
        }
        Ok(self.formatter.search_many(&query, &reports))
    }

    fn handle_list(&self, args: &ListArgs) -> Result<String> {
        let root = self.workspace.validate(&args.repo)?;
        if let Some(directory) = &args.directory {
            self.workspace.resolve_in(&root, directory)?;
        }
        let (include, exclude) = self.patterns(&args.filters);
        let request = ListRequest {
            root,
            directory: args.directory.clone(),
            recursive: args.recursive,
            include_patterns: include,
            exclude_patterns: exclude,
            limit: args.limit.unwrap_or(self.config.list.limit),
        };
        let outcome = list_files(&request)?;
        Ok(self.formatter.listing(&Listing {
            directory: args.directory.as_deref().unwrap_or(""),
            recursive: args.recursive,
            limit: request.limit,
            entries: &outcome.entries,
            truncated: outcome.truncated,
        }))
    }

    fn handle_read(
        &self,
        repo: &str,
        files: &[String],
        start: Option<usize>,
        end: Option<usize>,
    ) -> Result<String> {
        let root = self.workspace.validate(repo)?;
        let window = LineWindow::new(start, end, self.config.read.max_lines);
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            match self.workspace.resolve_in(&root, file) {
                Ok(_) => results.extend(read_files(&root, std::slice::from_ref(file), &window)),
                Err(e) => results.push(FileReadResult {
                    path: file.clone(),
                    content: None,
                    error: Some(e.to_string()),
                }),
            }
        }
        Ok(self.formatter.contents(&results))
    }

    fn handle_branches(&self, repo: &str, limit: Option<usize>) -> Result<String> {
        let root = self.workspace.validate(repo)?;
        let mut branches = self.git.branches(&root)?;
        let limited = match limit {
            Some(0) => return Err(WsgrepError::InvalidLimit),
            Some(limit) if branches.len() > limit => {
                branches.truncate(limit);
                true
            }
            _ => false,
        };
        Ok(self.formatter.branches(&branches, limited))
    }
}
