//! Path case normalization
//!
//! Git matches paths case-sensitively even on filesystems that don't. Before a
//! user-supplied path reaches git it is rewritten to the casing actually
//! stored on disk. Whether that is needed at all is decided once, up front,
//! and handed in as a [`CaseSensitivity`] value.

use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether the filesystem distinguishes `README` from `readme`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Map a `case_sensitive` config flag
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            Self::Sensitive
        } else {
            Self::Insensitive
        }
    }

    /// Probe the system temp directory
    pub fn detect() -> io::Result<Self> {
        Self::detect_in(&std::env::temp_dir())
    }

    /// Probe the filesystem holding `dir`.
    ///
    /// Creates a temp file with a lower-case name and checks whether its
    /// upper-cased name resolves too.
    pub fn detect_in(dir: &Path) -> io::Result<Self> {
        let probe = tempfile::Builder::new()
            .prefix("case-probe")
            .tempfile_in(dir)?;

        let upper = probe
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().to_uppercase())
            .ok_or_else(|| io::Error::other("temp file has no name"))?;

        let sensitivity = if dir.join(upper).exists() {
            Self::Insensitive
        } else {
            Self::Sensitive
        };

        debug!("Filesystem at {:?} is {:?}", dir, sensitivity);
        Ok(sensitivity)
    }
}

/// Rewrites relative paths to their on-disk casing
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    sensitivity: CaseSensitivity,
    /// Directory relative paths are resolved against
    base_dir: PathBuf,
}

impl PathNormalizer {
    pub fn new(sensitivity: CaseSensitivity, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            sensitivity,
            base_dir: base_dir.into(),
        }
    }

    pub fn sensitivity(&self) -> CaseSensitivity {
        self.sensitivity
    }

    /// Return `path` with the casing found on disk.
    ///
    /// Never fails: if some component can't be matched (odd characters, the
    /// file doesn't exist yet, unreadable directory) the input is returned
    /// untouched.
    pub fn real_case(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match self.sensitivity {
            CaseSensitivity::Sensitive => path.to_path_buf(),
            CaseSensitivity::Insensitive => self.walk(path).unwrap_or_else(|| {
                debug!("Could not resolve real case of {:?}, keeping it as is", path);
                path.to_path_buf()
            }),
        }
    }

    fn walk(&self, path: &Path) -> Option<PathBuf> {
        let mut dir = self.base_dir.clone();
        let mut real = PathBuf::new();

        for component in path.components() {
            match component {
                Component::CurDir => continue,
                Component::Normal(name) => {
                    let wanted = name.to_string_lossy().to_lowercase();
                    let entry = std::fs::read_dir(&dir)
                        .ok()?
                        .filter_map(|e| e.ok())
                        .find(|e| e.file_name().to_string_lossy().to_lowercase() == wanted)?;
                    let actual = entry.file_name();
                    dir.push(&actual);
                    real.push(&actual);
                }
                other => {
                    dir.push(other);
                    real.push(other);
                }
            }
        }

        Some(real)
    }
}
