//! Working-tree status classification
//!
//! Three loosely related signals are folded into one [`FileStatus`]:
//! - the porcelain `XY` code from `git status` (or its absence)
//! - the assume-unchanged bit from `git ls-files -v`
//! - whether the file is present on disk
//!
//! The porcelain code always wins. Assume-unchanged only matters for paths
//! git status is silent about, since a file can carry the bit and still have
//! staged changes.
//!
//! Codes outside the recognised table are an error, never a guess: they
//! mean a git version or state this classifier does not model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GitError, Result};

/// Status of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    TrackedUnmodified,
    TrackedModified,
    Untracked,
    AssumeUnchanged,
    Staged,
    Deleted,
    /// Changes were staged, then the file was deleted
    DeletedStaged,
    /// Marked assume-unchanged, then deleted
    DeletedAssumeUnchanged,
    InConflict,
    Ignored,
    /// Matches an ignore rule but was force-added
    IgnoredStaged,
    /// Tracked file modified again after staging
    ModifiedModified,
    /// New file modified after being added
    AddedModified,
    FileNotFound,
}

impl FileStatus {
    /// Two-character label used by the CLI listing
    pub fn short_label(&self) -> &'static str {
        match self {
            FileStatus::TrackedUnmodified => "  ",
            FileStatus::TrackedModified => " M",
            FileStatus::Untracked => "??",
            FileStatus::AssumeUnchanged => "h ",
            FileStatus::Staged => "A ",
            FileStatus::Deleted => " D",
            FileStatus::DeletedStaged => "AD",
            FileStatus::DeletedAssumeUnchanged => "hD",
            FileStatus::InConflict => "UU",
            FileStatus::Ignored => "!!",
            FileStatus::IgnoredStaged => "!A",
            FileStatus::ModifiedModified => "MM",
            FileStatus::AddedModified => "AM",
            FileStatus::FileNotFound => "--",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::TrackedUnmodified => "tracked, unmodified",
            FileStatus::TrackedModified => "tracked, modified",
            FileStatus::Untracked => "untracked",
            FileStatus::AssumeUnchanged => "assumed unchanged",
            FileStatus::Staged => "staged",
            FileStatus::Deleted => "deleted",
            FileStatus::DeletedStaged => "deleted after staging",
            FileStatus::DeletedAssumeUnchanged => "deleted while assumed unchanged",
            FileStatus::InConflict => "in conflict",
            FileStatus::Ignored => "ignored",
            FileStatus::IgnoredStaged => "ignored but staged",
            FileStatus::ModifiedModified => "modified after staging",
            FileStatus::AddedModified => "added, then modified",
            FileStatus::FileNotFound => "not found",
        };
        write!(f, "{}", s)
    }
}

/// Everything known about one path before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatusEntry {
    pub path: String,
    /// Porcelain code, `None` when git status doesn't mention the path
    pub code: Option<String>,
    pub is_assume_unchanged: bool,
    pub exists_on_disk: bool,
}

impl RawStatusEntry {
    pub fn new(
        path: impl Into<String>,
        code: Option<&str>,
        is_assume_unchanged: bool,
        exists_on_disk: bool,
    ) -> Self {
        Self {
            path: path.into(),
            code: code.map(str::to_string),
            is_assume_unchanged,
            exists_on_disk,
        }
    }

    /// Derive the status of this entry.
    ///
    /// `Staged` is returned for `"A "` even when the path is ignored; telling
    /// the two apart takes a second git query, see
    /// [`Repository::status_of`](crate::git::Repository::status_of).
    pub fn classify(&self) -> Result<FileStatus> {
        let Some(code) = self.code.as_deref() else {
            return Ok(match (self.is_assume_unchanged, self.exists_on_disk) {
                (true, true) => FileStatus::AssumeUnchanged,
                (true, false) => FileStatus::DeletedAssumeUnchanged,
                (false, _) => FileStatus::TrackedUnmodified,
            });
        };

        let status = match code {
            "??" => FileStatus::Untracked,
            "!!" => FileStatus::Ignored,
            " M" => FileStatus::TrackedModified,
            "A " => FileStatus::Staged,
            " D" => FileStatus::Deleted,
            "AD" => FileStatus::DeletedStaged,
            "MM" => FileStatus::ModifiedModified,
            "AM" => FileStatus::AddedModified,
            // unmerged index stages
            "AA" | "M " | "DD" => FileStatus::InConflict,
            c if c.contains('U') => FileStatus::InConflict,
            _ => {
                return Err(GitError::UnrecognizedStatus {
                    path: self.path.clone(),
                    code: code.to_string(),
                }
                .into());
            }
        };

        Ok(status)
    }
}

/// Fold a `Staged` status into `IgnoredStaged` when the path is known to be
/// both ignored and cached
pub fn refine_ignored_staged(status: FileStatus, ignored_and_cached: bool) -> FileStatus {
    match status {
        FileStatus::Staged if ignored_and_cached => FileStatus::IgnoredStaged,
        other => other,
    }
}
