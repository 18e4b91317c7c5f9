//! treestate - git working-tree status, annotated diffs and branch tracking
//!
//! Everything is answered by running the git CLI and classifying its output
//! into a small closed vocabulary.
//!
//! # Modules
//!
//! - [`git`] - Repository facade, status classifier, diff annotator
//! - [`config`] - Layered configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod git;

pub use config::Config;
pub use error::{Error, Result};
pub use git::{
    BranchTrackingInfo, CaseSensitivity, DiffLine, DiffLineKind, DiffResult, FileOpOutcome,
    FileStatus, Repository, RepositoryOptions,
};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
