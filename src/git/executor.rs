//! Git command executor
//!
//! The only I/O boundary of the crate:
//! - Commands are argv lists, never shell strings, so paths need no quoting
//! - stdout and stderr are drained together before the exit status is read
//! - No timeout and no retries: a hung git hangs the caller

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::{GitError, Result};

/// Default git binary
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Raw result of one backend invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Something that can run `git <args>` and hand back its output.
///
/// `run` only fails on transport problems (binary missing, spawn failure);
/// a non-zero exit is reported through [`CommandOutput::success`].
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run git with the given arguments
    async fn run(&self, args: &[&str]) -> Result<CommandOutput>;

    /// Run git and return stdout, turning a non-zero exit into
    /// [`GitError::CommandFailed`]
    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into())
        }
    }
}

/// Runs the real git binary inside a fixed working directory
#[derive(Debug, Clone)]
pub struct GitExecutor {
    /// Binary to invoke
    program: String,
    /// Directory every command runs in (the repository root)
    working_dir: PathBuf,
}

impl GitExecutor {
    /// Create an executor running `git` in `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: DEFAULT_GIT_PROGRAM.to_string(),
            working_dir: working_dir.into(),
        }
    }

    /// Use a different git binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Binary this executor invokes
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Directory commands run in
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Check if git is installed and accessible
    pub async fn check_installed(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .map_err(|_| GitError::NotInstalled(self.program.clone()))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            debug!("git version: {}", version.trim());
            Ok(())
        } else {
            Err(GitError::NotInstalled(self.program.clone()).into())
        }
    }
}

#[async_trait]
impl GitRunner for GitExecutor {
    #[instrument(skip(self), fields(args = ?args))]
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // output() reads both pipes to EOF before waiting on the child
        let output = cmd.output().await.map_err(|e| {
            warn!("failed to spawn {}: {}", self.program, e);
            GitError::NotInstalled(self.program.clone())
        })?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(
            success = result.success,
            stdout_len = result.stdout.len(),
            "git {}",
            args.join(" ")
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_creation() {
        let executor = GitExecutor::new("/tmp");
        assert_eq!(executor.program(), DEFAULT_GIT_PROGRAM);
        assert_eq!(executor.working_dir(), Path::new("/tmp"));
    }

    #[test]
    fn test_executor_with_custom_program() {
        let executor = GitExecutor::new("/tmp").with_program("/usr/local/bin/git");
        assert_eq!(executor.program(), "/usr/local/bin/git");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_installed() {
        let executor = GitExecutor::new(std::env::temp_dir())
            .with_program("treestate-no-such-git-binary");

        let err = executor.run(&["status"]).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Git(GitError::NotInstalled(_))
        ));
        assert!(executor.check_installed().await.is_err());
    }

    struct Canned(CommandOutput);

    #[async_trait]
    impl GitRunner for Canned {
        async fn run(&self, _args: &[&str]) -> Result<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_run_checked_success_returns_stdout() {
        let runner = Canned(CommandOutput::ok("hello\n"));
        assert_eq!(runner.run_checked(&["log"]).await.unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn test_run_checked_failure_carries_output() {
        let runner = Canned(CommandOutput::failed("fatal: bad revision"));
        let err = runner.run_checked(&["show", "nope"]).await.unwrap_err();
        match err {
            crate::error::Error::Git(GitError::CommandFailed {
                command, stderr, ..
            }) => {
                assert_eq!(command, "git show nope");
                assert!(stderr.contains("bad revision"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
