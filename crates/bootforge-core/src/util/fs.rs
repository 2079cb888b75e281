//! Filesystem utilities.

use bootforge_types::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading tilde to the user's home directory.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Read entire file as string (slurp).
pub fn slurp(path: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(path).map_err(Into::into)
}

/// Create a directory and all missing parents.
pub fn mkdir_p(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path).map_err(Into::into)
}

/// Remove a file; a missing file is not an error.
pub fn rmfile(path: impl AsRef<Path>) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Remove a directory tree; a missing tree is not an error.
pub fn rmtree(path: impl AsRef<Path>) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Copy a file, creating the destination directory if needed.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = dst.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Create or replace a symlink at `link` pointing at `target`.
#[cfg(unix)]
pub fn symlink_force(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let link = link.as_ref();
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    rmfile(link)?;
    std::os::unix::fs::symlink(target, link).map_err(Into::into)
}

/// Create or replace a symlink at `link` pointing at `target`.
#[cfg(not(unix))]
pub fn symlink_force(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    // Non-unix hosts get a copy instead of a link.
    copy_file(target, link)
}
