use crate::error::{Result, WsgrepError};
use crate::vcs::VersionControl;
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Validates user-supplied paths before any operation touches them.
pub trait PathGuard {
    /// Returns the absolute, contained form of `user_path`.
    fn validate(&self, user_path: &str) -> Result<PathBuf>;
}

/// The managed directory holding every working copy.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub const DEFAULT_DIR: &'static str = "./workspace";

    /// Opens `dir` as a workspace, creating it if absent.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let absolute = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };
        let absolute = normalize_lexically(&absolute);
        fs::create_dir_all(&absolute)?;
        let root = absolute.canonicalize()?;
        debug!("Using workspace: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `relative` against `base` (a path already validated by this
    /// workspace) with the same containment rule.
    pub fn resolve_in(&self, base: &Path, relative: &str) -> Result<PathBuf> {
        if relative.trim().is_empty() {
            return Err(WsgrepError::EmptyPath);
        }
        let joined = base.join(relative.trim());
        let resolved = contain(base, &joined)?;
        contain(&self.root, &resolved)
    }

    /// Names of direct child directories that are version-controlled, sorted.
    pub fn list_repositories(&self, vcs: &impl VersionControl) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && vcs.is_version_controlled(&entry.path()) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl PathGuard for Workspace {
    fn validate(&self, user_path: &str) -> Result<PathBuf> {
        let user_path = user_path.trim();
        if user_path.is_empty() {
            return Err(WsgrepError::EmptyPath);
        }
        let candidate = Path::new(user_path);
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };
        contain(&self.root, &candidate)
    }
}

fn contain(base: &Path, candidate: &Path) -> Result<PathBuf> {
    let outside = |path: PathBuf| WsgrepError::OutsideWorkspace {
        path,
        workspace: base.to_path_buf(),
    };

    let normalized = normalize_lexically(candidate);
    if !normalized.starts_with(base) {
        return Err(outside(normalized));
    }
    if !normalized.exists() {
        return Ok(normalized);
    }
    // Re-check after resolving symlinks.
    let canonical = normalized.canonicalize()?;
    if !canonical.starts_with(base) {
        return Err(outside(canonical));
    }
    Ok(canonical)
}

/// Collapses `.` and `..` without touching the filesystem. `..` never
/// climbs above the root component.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_paths_resolve_inside() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        fs::create_dir(ws.root().join("repo")).unwrap();

        assert_eq!(ws.validate("repo").unwrap(), ws.root().join("repo"));
        assert_eq!(ws.validate("./repo/../repo").unwrap(), ws.root().join("repo"));
        assert_eq!(ws.validate("not-yet").unwrap(), ws.root().join("not-yet"));
    }

    #[test]
    fn test_escapes_are_rejected() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        assert!(matches!(
            ws.validate("../outside"),
            Err(WsgrepError::OutsideWorkspace { .. })
        ));
        assert!(matches!(
            ws.validate("repo/../../outside"),
            Err(WsgrepError::OutsideWorkspace { .. })
        ));
        assert!(matches!(
            ws.validate(&dir.path().to_string_lossy()),
            Err(WsgrepError::OutsideWorkspace { .. })
        ));
        assert!(matches!(ws.validate("  "), Err(WsgrepError::EmptyPath)));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_outside() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        let sibling = format!("{}2/repo", ws.root().display());
        assert!(ws.validate(&sibling).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        fs::create_dir(dir.path().join("secret")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret"), ws.root().join("link")).unwrap();
        assert!(matches!(
            ws.validate("link"),
            Err(WsgrepError::OutsideWorkspace { .. })
        ));
    }

    #[test]
    fn test_resolve_in_repository() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        let repo = ws.root().join("repo");
        fs::create_dir_all(repo.join("src")).unwrap();
        fs::write(repo.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(ws.root().join("other.txt"), "x").unwrap();

        assert_eq!(
            ws.resolve_in(&repo, "src/main.rs").unwrap(),
            repo.join("src/main.rs")
        );
        assert!(matches!(
            ws.resolve_in(&repo, "../other.txt"),
            Err(WsgrepError::OutsideWorkspace { .. })
        ));
        assert!(matches!(ws.resolve_in(&repo, ""), Err(WsgrepError::EmptyPath)));
    }

    #[test]
    fn test_list_repositories() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws")).unwrap();
        fs::create_dir_all(ws.root().join("b/.git")).unwrap();
        fs::create_dir_all(ws.root().join("a/.git")).unwrap();
        fs::create_dir_all(ws.root().join("plain")).unwrap();
        fs::write(ws.root().join("file.txt"), "x").unwrap();
        assert_eq!(ws.list_repositories(&crate::vcs::Git).unwrap(), vec!["a", "b"]);
    }
}
