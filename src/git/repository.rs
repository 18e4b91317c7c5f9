//! Repository handle
//!
//! Discovery uses gitoxide; every query after that goes through the git CLI
//! via a [`GitRunner`], so results match what the user's git reports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::diff::{annotate, DiffResult};
use super::executor::{GitExecutor, GitRunner, DEFAULT_GIT_PROGRAM};
use super::path::{CaseSensitivity, PathNormalizer};
use super::porcelain::{first_by_path, parse_index_listing, parse_path_listing, parse_status_listing};
use super::status::{refine_ignored_staged, FileStatus, RawStatusEntry};
use crate::error::{GitError, Result};

/// Knobs for opening a repository
#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    /// Git binary to run
    pub git_program: String,
    /// Tell force-added ignored files apart from plain staged ones
    pub ignored_staged_check: bool,
    /// `None` probes the filesystem
    pub case_sensitivity: Option<CaseSensitivity>,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            ignored_staged_check: true,
            case_sensitivity: None,
        }
    }
}

impl RepositoryOptions {
    fn resolve_case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity.unwrap_or_else(|| {
            CaseSensitivity::detect().unwrap_or_else(|e| {
                warn!("Case sensitivity probe failed ({}), assuming case-sensitive", e);
                CaseSensitivity::Sensitive
            })
        })
    }
}

/// A git working tree, queried through the git CLI
///
/// All paths taken and returned are relative to the repository root.
#[derive(Clone)]
pub struct Repository {
    /// Working tree root
    root: PathBuf,
    runner: Arc<dyn GitRunner>,
    normalizer: PathNormalizer,
    ignored_staged_check: bool,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("case_sensitivity", &self.normalizer.sensitivity())
            .field("ignored_staged_check", &self.ignored_staged_check)
            .finish()
    }
}

impl Repository {
    /// Discover the repository containing `path` (searches parent directories)
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn discover(path: impl AsRef<Path>, options: RepositoryOptions) -> Result<Self> {
        let path = path.as_ref();

        let repo = gix::discover(path).map_err(|e| {
            debug!("discovery failed: {}", e);
            GitError::NotARepository(path.to_path_buf())
        })?;

        // linked worktrees and submodules keep their git dir elsewhere
        let Some(root) = repo.work_dir().map(Path::to_path_buf) else {
            debug!("bare repository at {:?}", repo.path());
            return Err(GitError::NotARepository(path.to_path_buf()).into());
        };
        let root = std::fs::canonicalize(&root).unwrap_or(root);

        debug!("Discovered repository at {:?}", root);

        let executor = GitExecutor::new(&root).with_program(&options.git_program);
        Ok(Self::with_runner(root, Arc::new(executor), options))
    }

    /// Build a repository around an arbitrary runner
    pub fn with_runner(
        root: impl Into<PathBuf>,
        runner: Arc<dyn GitRunner>,
        options: RepositoryOptions,
    ) -> Self {
        let root = root.into();
        let sensitivity = options.resolve_case_sensitivity();
        Self {
            normalizer: PathNormalizer::new(sensitivity, &root),
            root,
            runner,
            ignored_staged_check: options.ignored_staged_check,
        }
    }

    /// Get the working tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the repository name (directory name)
    pub fn repo_name(&self) -> String {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    pub(crate) fn runner(&self) -> &dyn GitRunner {
        self.runner.as_ref()
    }

    /// Path with on-disk casing, as git expects it
    pub fn normalize(&self, path: impl AsRef<Path>) -> String {
        self.normalizer
            .real_case(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Turn a user path, relative to `cwd`, into a path relative to the root.
    ///
    /// Only the parent directory is resolved, so a symlink is named as itself
    /// rather than as its target.
    pub fn relative_path(&self, cwd: &Path, path: &Path) -> Result<PathBuf> {
        let absolute = cwd.join(path);
        let resolved = match (absolute.parent(), absolute.file_name()) {
            (Some(parent), Some(name)) => std::fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| absolute.clone()),
            _ => std::fs::canonicalize(&absolute).unwrap_or_else(|_| absolute.clone()),
        };

        resolved
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::OutsideRepository(path.to_path_buf()).into())
    }

    pub(crate) async fn exists_on_disk(&self, path: &str) -> bool {
        // symlink_metadata so a dangling link still counts as present
        tokio::fs::symlink_metadata(self.root.join(path)).await.is_ok()
    }

    /// Status of a single path.
    ///
    /// Returns [`FileStatus::FileNotFound`] when git knows the path neither
    /// from the index nor from the working tree.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn status_of(&self, path: impl AsRef<Path>) -> Result<FileStatus> {
        let path = self.normalize(path);

        let listed = self
            .runner
            .run(&[
                "ls-files", "-v", "-c", "-o", "--full-name", "--error-unmatch", "--", &path,
            ])
            .await?;
        if !listed.success {
            debug!("{} is unknown to git", path);
            return Ok(FileStatus::FileNotFound);
        }

        let is_assume_unchanged = parse_index_listing(&listed.stdout)?
            .first()
            .is_some_and(|e| e.is_assume_unchanged());

        let status = self.runner.run_checked(&status_args(Some(path.as_str()))).await?;
        let code = parse_status_listing(&status)?
            .into_iter()
            .next()
            .map(|line| line.code);

        let entry = RawStatusEntry {
            exists_on_disk: self.exists_on_disk(&path).await,
            path,
            code,
            is_assume_unchanged,
        };
        let status = entry.classify()?;

        if status == FileStatus::Staged && self.ignored_staged_check {
            let ignored = self.ignored_and_cached(Some(entry.path.as_str())).await?;
            return Ok(refine_ignored_staged(status, !ignored.is_empty()));
        }

        Ok(status)
    }

    /// Status of every path git reports: tracked files first, in index
    /// order, then untracked and ignored ones
    #[instrument(skip(self))]
    pub async fn status_of_tree(&self) -> Result<Vec<(FileStatus, String)>> {
        let index_out = self.runner.run_checked(&["ls-files", "-v", "--full-name"]).await?;
        let index = parse_index_listing(&index_out)?;

        let status_out = self.runner.run_checked(&status_args(None)).await?;
        let status = parse_status_listing(&status_out)?;

        let ignored_and_cached: HashSet<String> =
            if self.ignored_staged_check && status.iter().any(|s| s.code == "A ") {
                self.ignored_and_cached(None).await?.into_iter().collect()
            } else {
                HashSet::new()
            };

        let codes: HashMap<&str, &str> = status
            .iter()
            .map(|s| (s.path.as_str(), s.code.as_str()))
            .collect();
        let assume_unchanged: HashSet<&str> = index
            .iter()
            .filter(|e| e.is_assume_unchanged())
            .map(|e| e.path.as_str())
            .collect();

        let paths = first_by_path(
            index
                .iter()
                .map(|e| e.path.clone())
                .chain(status.iter().map(|s| s.path.clone()))
                .collect(),
            |p: &String| p.clone(),
        );

        let mut result = Vec::with_capacity(paths.len());
        for path in paths {
            let entry = RawStatusEntry::new(
                path.as_str(),
                codes.get(path.as_str()).copied(),
                assume_unchanged.contains(path.as_str()),
                self.exists_on_disk(&path).await,
            );
            let status = refine_ignored_staged(entry.classify()?, ignored_and_cached.contains(&path));
            result.push((status, path));
        }

        debug!("Classified {} paths", result.len());
        Ok(result)
    }

    /// Paths marked assume-unchanged
    pub async fn assume_unchanged_files(&self) -> Result<Vec<String>> {
        let out = self.runner.run_checked(&["ls-files", "-v", "--full-name"]).await?;
        Ok(parse_index_listing(&out)?
            .into_iter()
            .filter(|e| e.is_assume_unchanged())
            .map(|e| e.path)
            .collect())
    }

    /// Tracked paths that match an ignore rule
    async fn ignored_and_cached(&self, path: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec!["ls-files", "-i", "-c", "--exclude-standard", "--full-name"];
        if let Some(path) = path {
            args.extend(["--", path]);
        }
        let out = self.runner.run_checked(&args).await?;
        Ok(parse_path_listing(&out))
    }

    /// Working tree changes of `path` against the index
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn diff(&self, path: impl AsRef<Path>) -> Result<DiffResult> {
        let path = self.normalize(path);
        let out = self
            .runner
            .run_checked(&["diff", "--no-color", "--no-ext-diff", "--", &path])
            .await?;
        annotate(&out)
    }

    /// Staged changes of `path` against HEAD
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn staged_diff(&self, path: impl AsRef<Path>) -> Result<DiffResult> {
        let path = self.normalize(path);
        let out = self
            .runner
            .run_checked(&["diff", "--cached", "--no-color", "--no-ext-diff", "--", &path])
            .await?;
        annotate(&out)
    }

    /// Value of a git config key, `None` when unset
    pub async fn config_value(&self, key: &str) -> Result<Option<String>> {
        let output = self.runner.run(&["config", key]).await?;
        Ok(output
            .success
            .then(|| output.stdout.trim().to_string()))
    }
}

fn status_args(path: Option<&str>) -> Vec<&str> {
    let mut args = vec![
        "--no-optional-locks",
        "status",
        "--porcelain",
        "--ignored",
        "--untracked-files=all",
        "--no-renames",
    ];
    if let Some(path) = path {
        args.extend(["--", path]);
    }
    args
}
