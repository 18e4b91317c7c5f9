//! Branch and remote listings

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::repository::Repository;
use crate::error::{GitError, Result};

// <marker> <name> <sha> <rest>
static BRANCH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([*+ ]) (\S+) +\w+(?: (.*))?$").unwrap());

/// One local branch as listed by `git branch -vv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTrackingInfo {
    /// Branch name, or the parenthesised description when HEAD is detached
    pub name: String,
    pub is_current: bool,
    /// `remote/branch` this branch tracks
    pub tracks: Option<String>,
    pub is_detached: bool,
}

/// Parse one line of `git branch --list -vv`
pub fn parse_branch_line(line: &str) -> Result<BranchTrackingInfo> {
    if let Some(rest) = line.strip_prefix("* (") {
        let description = rest
            .split_once(')')
            .map(|(inside, _)| inside)
            .ok_or_else(|| GitError::UnexpectedOutput(format!("branch line '{line}'")))?;
        return Ok(BranchTrackingInfo {
            name: format!("({description})"),
            is_current: true,
            tracks: None,
            is_detached: true,
        });
    }

    let caps = BRANCH_LINE
        .captures(line)
        .ok_or_else(|| GitError::UnexpectedOutput(format!("branch line '{line}'")))?;

    let marker = &caps[1];
    let mut rest = caps.get(3).map_or("", |m| m.as_str());
    if marker == "+" {
        // worktree location precedes the tracking info
        if let Some(after) = rest.strip_prefix('(').and_then(|r| r.split_once(") ")) {
            rest = after.1;
        }
    }

    let tracks = rest
        .strip_prefix('[')
        .and_then(|r| r.split_once(']'))
        .map(|(info, _)| info.split(':').next().unwrap_or(info).to_string());

    Ok(BranchTrackingInfo {
        name: caps[2].to_string(),
        is_current: marker == "*",
        tracks,
        is_detached: false,
    })
}

impl Repository {
    /// Every local branch
    #[instrument(skip(self))]
    pub async fn branch_status_all(&self) -> Result<Vec<BranchTrackingInfo>> {
        let out = self.runner().run_checked(&["branch", "--list", "-vv"]).await?;
        out.lines()
            .filter(|l| !l.trim().is_empty())
            .map(parse_branch_line)
            .collect()
    }

    /// A single branch, `None` if it doesn't exist
    pub async fn branch_status(&self, name: &str) -> Result<Option<BranchTrackingInfo>> {
        let out = self
            .runner()
            .run_checked(&["branch", "--list", "-vv", "--", name])
            .await?;
        out.lines()
            .find(|l| !l.trim().is_empty())
            .map(parse_branch_line)
            .transpose()
    }

    /// Name of the checked-out branch, `None` when HEAD is detached
    pub async fn current_branch(&self) -> Result<Option<String>> {
        Ok(self
            .branch_status_all()
            .await?
            .into_iter()
            .find(|b| b.is_current && !b.is_detached)
            .map(|b| b.name))
    }

    /// Configured remote names
    pub async fn remotes(&self) -> Result<Vec<String>> {
        let out = self.runner().run_checked(&["remote"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Branches of `remote`, without the `remote/` prefix
    pub async fn remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        let out = self.runner().run_checked(&["branch", "-r"]).await?;
        let prefix = format!("{remote}/");
        Ok(out
            .lines()
            .filter(|l| !l.contains("->"))
            .filter_map(|l| l.trim().strip_prefix(&prefix))
            .map(str::to_string)
            .collect())
    }
}
