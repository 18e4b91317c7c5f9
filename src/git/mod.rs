//! Git working-tree queries through the git CLI
//!
//! - `Repository` - discovery plus status, diff, file and branch operations
//! - `GitExecutor` - the process boundary, behind the `GitRunner` trait
//! - `PathNormalizer` - on-disk casing for user paths
//! - `annotate` - line numbers for unified diffs

mod branch;
mod diff;
mod executor;
mod file;
mod path;
mod porcelain;
mod repository;
mod status;

#[cfg(test)]
mod testing;

pub use branch::*;
pub use diff::*;
pub use executor::*;
pub use file::*;
pub use path::*;
pub use porcelain::*;
pub use repository::*;
pub use status::*;
