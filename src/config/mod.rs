//! Configuration module
//!
//! User configuration lives in `config.toml` under the platform config dir
//! and can be overridden with `TREESTATE_*` environment variables.

mod settings;

pub use settings::*;
