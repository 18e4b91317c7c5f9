//! Error types for treestate
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.
//!
//! "Not found" outcomes are not errors here: they surface as
//! [`FileStatus::FileNotFound`](crate::git::FileStatus::FileNotFound) or `None`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for treestate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Git backend errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("{0} is outside the repository")]
    OutsideRepository(PathBuf),

    #[error("Could not run '{0}': is git installed and in PATH?")]
    NotInstalled(String),

    #[error("Git command failed: {command} - out: {stdout}, err: {stderr}")]
    CommandFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("Unrecognized status '{code}' for file {path}")]
    UnrecognizedStatus { path: String, code: String },

    #[error("Unexpected git output: {0}")]
    UnexpectedOutput(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
