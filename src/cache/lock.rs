//! Cross-process file locking for artifact installation.
//!
//! Two processes fetching into the same directory would otherwise race
//! between the existence check and the download. On Unix systems the lock uses
//! `flock(2)`; on other platforms locking is a no-op.

use camino::Utf8Path;
use std::fs::{File, OpenOptions};
use std::io;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Subdirectory within the target directory for lock files.
const LOCKS_SUBDIR: &str = ".locks";

/// Guard that holds an exclusive artifact lock until dropped.
#[derive(Debug)]
pub struct ArtifactLock {
    _file: File,
}

impl ArtifactLock {
    /// Blocks until the exclusive lock for `file_name` in `target_dir` is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or the lock cannot
    /// be acquired.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use prisma_engine_fetch::cache::ArtifactLock;
    ///
    /// let dir = Utf8Path::new("/tmp/prisma-binaries");
    /// let _lock = ArtifactLock::acquire(dir, "prisma-query-engine-darwin")?;
    /// // Only this process may install prisma-query-engine-darwin now.
    /// # Ok::<(), std::io::Error>(())
    /// ```
    #[cfg(unix)]
    pub fn acquire(target_dir: &Utf8Path, file_name: &str) -> io::Result<Self> {
        let locks_dir = target_dir.join(LOCKS_SUBDIR);
        std::fs::create_dir_all(&locks_dir)?;

        let lock_path = locks_dir.join(format!("{file_name}.lock"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // SAFETY: The descriptor comes from `file`, which was just opened and
        // stays owned by this scope until after `flock` returns.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { _file: file })
    }

    /// No-op lock acquisition on non-Unix platforms.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder file cannot be created.
    #[cfg(not(unix))]
    pub fn acquire(_target_dir: &Utf8Path, file_name: &str) -> io::Result<Self> {
        let temp_path = std::env::temp_dir().join(format!("prisma-fetch-lock-{file_name}.tmp"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        drop(std::fs::remove_file(&temp_path));
        Ok(Self { _file: file })
    }
}
