//! Common filesystem utilities

use crate::core::error::{Result, TrondError};
use std::path::Path;

/// What, if anything, lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Dir,
}

/// Classify a path without following the error path into callers.
pub fn path_kind(path: &Path) -> PathKind {
    match std::fs::metadata(path) {
        Ok(md) if md.is_dir() => PathKind::Dir,
        Ok(_) => PathKind::File,
        Err(_) => PathKind::Missing,
    }
}

/// Fail with `MissingFile` unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<()> {
    if path_kind(path) != PathKind::File {
        return Err(TrondError::MissingFile(path.to_path_buf()));
    }
    Ok(())
}

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Set file permissions (Unix only).
///
/// No-op on non-Unix platforms.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
