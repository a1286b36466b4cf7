//! Utility functions for leproc

use std::env;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and fold `.` and `..` components.
///
/// Purely lexical: nothing is read from disk, so the result carries no
/// `\\?\` verbatim prefix and symlinks are left alone.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root or drive prefix
                if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Directory containing the running launcher executable
pub fn launcher_dir() -> std::io::Result<PathBuf> {
    let exe = env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
