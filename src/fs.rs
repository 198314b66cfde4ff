//! Shared filesystem helpers that operate through ambient capability handles.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use color_eyre::eyre::{Context, Result};
use std::io::{self, ErrorKind};

#[cfg(unix)]
use cap_std::fs::{Permissions, PermissionsExt};

/// Mode applied to installed artifacts so they can be executed directly.
#[cfg(unix)]
pub(crate) const EXECUTABLE_MODE: u32 = 0o777;

/// Resolves a path to an ambient directory handle paired with the relative path component.
///
/// Absolute paths are opened relative to the ambient root; relative paths reuse the current
/// working directory.
pub(crate) fn ambient_dir_and_path(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    if path.has_root() {
        let stripped = path
            .strip_prefix("/")
            .map_or_else(|_| path.to_path_buf(), Utf8Path::to_path_buf);
        let dir = Dir::open_ambient_dir("/", ambient_authority())
            .context("open ambient root directory")?;
        Ok((dir, stripped))
    } else {
        let dir = Dir::open_ambient_dir(".", ambient_authority())
            .context("open ambient working directory")?;
        Ok((dir, path.to_path_buf()))
    }
}

/// Ensures the provided path exists, creating intermediate directories when required.
pub(crate) fn ensure_dir_exists(path: &Utf8Path) -> Result<()> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }

    dir.create_dir_all(relative.as_std_path())
        .or_else(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                Ok(())
            } else {
                Err(err)
            }
        })
        .with_context(|| format!("create {}", path.as_str()))
}

/// Reports whether any filesystem entry (file, directory, or dangling symlink) exists at `path`.
pub(crate) fn entry_exists(path: &Utf8Path) -> Result<bool> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    match dir.symlink_metadata(relative.as_std_path()) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("stat {}", path.as_str())),
    }
}

/// Creates (or truncates) `path` as an executable file and returns a standard handle to it.
pub(crate) fn create_executable(path: &Utf8Path) -> Result<std::fs::File> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    let file = dir
        .create(relative.as_std_path())
        .with_context(|| format!("create {}", path.as_str()))?;
    #[cfg(unix)]
    set_permissions(path, EXECUTABLE_MODE)?;
    Ok(file.into_std())
}

/// Applies the provided POSIX mode to the given path when it exists.
#[cfg(unix)]
pub(crate) fn set_permissions(path: &Utf8Path, mode: u32) -> Result<()> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }

    dir.set_permissions(relative.as_std_path(), Permissions::from_mode(mode))
        .with_context(|| format!("chmod {}", path.as_str()))
}

/// Renames `from` over `to`, replacing any existing entry in a single step.
///
/// Both paths must live on the same filesystem.
pub(crate) fn rename_into_place(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    let (from_dir, from_relative) = ambient_dir_and_path(from)?;
    let (to_dir, to_relative) = ambient_dir_and_path(to)?;
    from_dir
        .rename(from_relative.as_std_path(), &to_dir, to_relative.as_std_path())
        .with_context(|| format!("rename {from} to {to}"))
}

/// Removes `path`, treating a missing file as success.
pub(crate) fn remove_file_if_present(path: &Utf8Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
