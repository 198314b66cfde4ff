//! Resolves the versioned directories that hold fetched binaries.
//!
//! Both roots share the same layout beneath them:
//! `<root>/prisma/prisma-engine-fetch-binaries/<version>`.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::eyre;

use crate::PRISMA_VERSION;
use crate::error::{PathError, PathResult};

/// Directory created directly beneath the OS root.
const PRISMA_SUBDIR: &str = "prisma";

/// Prefix for the per-crate binaries directory.
const NAMESPACE: &str = "prisma-engine-fetch";

/// Standard directory that anchors the binary cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheRoot {
    /// The OS temporary directory; contents may be cleared between boots.
    Temp,
    /// The per-user cache directory (`$XDG_CACHE_HOME`, `~/Library/Caches`, ...).
    #[default]
    User,
}

impl CacheRoot {
    /// Returns the OS directory backing this root.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the user cache directory cannot be
    /// determined or the directory is not valid UTF-8.
    pub fn root_dir(self) -> PathResult<Utf8PathBuf> {
        let raw = match self {
            Self::Temp => std::env::temp_dir(),
            Self::User => dirs::cache_dir()
                .ok_or_else(|| PathError::from(eyre!("could not read user cache dir")))?,
        };
        Utf8PathBuf::from_path_buf(raw).map_err(|path| {
            PathError::from(eyre!(
                "{self:?} directory is not valid UTF-8: {}",
                path.display()
            ))
        })
    }

    /// Resolves the versioned binaries directory beneath this root.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`CacheRoot::root_dir`].
    pub fn resolve(self, version: &str) -> PathResult<Utf8PathBuf> {
        Ok(base_dir(&self.root_dir()?, version))
    }
}

/// Computes `<root>/prisma/prisma-engine-fetch-binaries/<version>`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use prisma_engine_fetch::cache::base_dir;
///
/// let dir = base_dir(Utf8Path::new("/var/cache"), "2.0.0");
/// assert_eq!(dir, "/var/cache/prisma/prisma-engine-fetch-binaries/2.0.0");
/// ```
#[must_use]
pub fn base_dir(root: &Utf8Path, version: &str) -> Utf8PathBuf {
    root.join(PRISMA_SUBDIR)
        .join(format!("{NAMESPACE}-binaries"))
        .join(version)
}

/// Returns the binaries directory beneath the OS temp directory.
///
/// # Errors
///
/// Returns a [`PathError`] when the temp directory is not valid UTF-8.
pub fn global_temp_dir() -> PathResult<Utf8PathBuf> {
    CacheRoot::Temp.resolve(PRISMA_VERSION)
}

/// Returns the binaries directory beneath the user cache directory.
///
/// # Errors
///
/// Returns a [`PathError`] when the OS reports no user cache directory.
pub fn global_cache_dir() -> PathResult<Utf8PathBuf> {
    CacheRoot::User.resolve(PRISMA_VERSION)
}
