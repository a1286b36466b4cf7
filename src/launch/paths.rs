//! Target path resolution against the working directory and PATH

use crate::exceptions::{LaunchError, Result};
use crate::utils::absolutize;
use log::{debug, trace};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const EXE_EXTENSION: &str = "exe";

/// Ordered list of directories searched for executables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Split a PATH-style value using the platform separator
    pub fn parse(value: &OsStr) -> Self {
        let dirs = env::split_paths(value)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect();
        Self { dirs }
    }

    /// Snapshot of the current process PATH
    pub fn from_env() -> Self {
        env::var_os("PATH")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// True when `path` ends in `.exe`, ignoring case
pub fn has_exe_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXE_EXTENSION))
}

/// Resolves raw targets to absolute executable paths
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    current_dir: &'a Path,
    search_path: &'a SearchPath,
}

impl<'a> PathResolver<'a> {
    pub fn new(current_dir: &'a Path, search_path: &'a SearchPath) -> Self {
        Self {
            current_dir,
            search_path,
        }
    }

    /// Resolve `raw` to an existing `.exe` file.
    ///
    /// `.exe` is appended unless already present. The working directory is
    /// tried first, then each search directory in order.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf> {
        let mut candidate = raw.to_string();
        if !has_exe_extension(Path::new(raw)) {
            candidate.push_str(".exe");
        }
        let candidate = PathBuf::from(candidate);
        trace!("🔍 Resolving target '{}' as {:?}", raw, candidate);

        let local = absolutize(self.current_dir, &candidate);
        if local.is_file() {
            debug!("🔍 Resolved '{}' to {:?}", raw, local);
            return Ok(local);
        }

        for dir in self.search_path.dirs() {
            let full_path = dir.join(&candidate);
            if full_path.is_file() {
                let resolved = absolutize(self.current_dir, &full_path);
                debug!("🔍 Resolved '{}' to {:?} via PATH", raw, resolved);
                return Ok(resolved);
            }
        }

        debug!("❌ '{}' not found in working directory or PATH", raw);
        Err(LaunchError::PathNotFound(raw.to_string()))
    }
}
