//! Index and history operations on single files

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::repository::Repository;
use crate::error::Result;

/// Outcome of a file operation that can miss its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOpOutcome {
    Success,
    FileNotFound,
}

impl Repository {
    /// Stage the current contents of `path`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn stage(&self, path: impl AsRef<Path>) -> Result<FileOpOutcome> {
        let path = self.normalize(path);
        if !self.exists_on_disk(&path).await {
            return Ok(FileOpOutcome::FileNotFound);
        }
        self.runner().run_checked(&["add", "--", &path]).await?;
        Ok(FileOpOutcome::Success)
    }

    /// Drop staged changes of `path`, keeping the working copy
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn unstage(&self, path: impl AsRef<Path>) -> Result<FileOpOutcome> {
        let path = self.normalize(path);
        // reset exits 1 whenever unstaged changes remain anywhere
        let output = self.runner().run(&["reset", "HEAD", "--", &path]).await?;
        if !output.success {
            debug!("reset exited non-zero: {}", output.stderr.trim());
        }
        Ok(FileOpOutcome::Success)
    }

    /// Contents of `path` at `commit`, `None` if it isn't there
    pub async fn show(&self, path: impl AsRef<Path>, commit: &str) -> Result<Option<String>> {
        let path = self.normalize(path);
        let object = format!("{commit}:{path}");
        let output = self.runner().run(&["show", &object]).await?;
        Ok(output.success.then_some(output.stdout))
    }

    /// Set the assume-unchanged bit on `path`
    pub async fn assume_unchanged(&self, path: impl AsRef<Path>) -> Result<()> {
        self.update_index_flag(path, "--assume-unchanged").await
    }

    /// Clear the assume-unchanged bit on `path`
    pub async fn no_assume_unchanged(&self, path: impl AsRef<Path>) -> Result<()> {
        self.update_index_flag(path, "--no-assume-unchanged").await
    }

    async fn update_index_flag(&self, path: impl AsRef<Path>, flag: &str) -> Result<()> {
        let path = self.normalize(path);
        self.runner()
            .run_checked(&["update-index", flag, "--", &path])
            .await?;
        Ok(())
    }
}
