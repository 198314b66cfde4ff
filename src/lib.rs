//! Fetches and caches the prebuilt Prisma CLI and engine binaries.
//!
//! Artifacts are downloaded as gzip streams from the public object stores,
//! decompressed, and installed at deterministic paths such as
//! `<dir>/prisma-query-engine-debian-openssl-1.1.x`. An artifact that is
//! already present is never downloaded again.
//!
//! ```no_run
//! use prisma_engine_fetch::{BinaryFetcher, FetchConfig, Platform, cache};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = BinaryFetcher::new(FetchConfig::default(), Platform::detect())?;
//! let dir = cache::global_cache_dir()?;
//! fetcher.fetch_all_engines(&dir)?;
//! # Ok(())
//! # }
//! ```

mod artifact;
pub mod cache;
mod error;
mod fetch;
mod fs;
mod install;
mod observability;
mod platform;
#[doc(hidden)]
pub mod test_support;

pub use artifact::Artifact;
pub use error::{
    ConfigError, ConfigResult, DownloadError, DownloadErrorKind, DownloadResult, FetchError,
    PathError, PathResult, Result, ValidationError,
};
pub use fetch::{
    BinaryFetcher, CLI_PACKAGE, DEFAULT_CLI_URL, DEFAULT_ENGINE_URL, FetchConfig,
};
pub use install::{InstallOptions, install_with, run};
pub use platform::{Platform, os_name};

use camino::Utf8PathBuf;
use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::time::Duration;

use crate::cache::CacheRoot;

/// Release of the Prisma CLI fetched by default.
pub const PRISMA_VERSION: &str = "2.0.0-alpha.443";

/// Engine commit fetched by default.
///
/// Engine builds are published per commit of the engines repository's
/// `master` branch.
pub const ENGINE_VERSION: &str = "2eb5a63ad82e15dc2c248a0ac84dc28cd35542d6";

/// Captures fetch settings supplied via environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "PRISMA")]
///
/// # Examples
/// ```
/// use prisma_engine_fetch::FetchEnvCfg;
///
/// let cfg = FetchEnvCfg::default();
/// assert!(cfg.cli_url.is_none());
/// ```
pub struct FetchEnvCfg {
    /// CLI URL template overriding the public store (`PRISMA_CLI_URL`).
    pub cli_url: Option<String>,
    /// Engine URL template overriding the public store (`PRISMA_ENGINE_URL`).
    pub engine_url: Option<String>,
    /// Directory receiving the binaries instead of the standard cache.
    pub binary_dir: Option<Utf8PathBuf>,
    /// Platform tag used for the CLI, skipping detection.
    pub platform: Option<String>,
    /// SSL-variant binary name used for engines, skipping detection.
    pub binary_platform: Option<String>,
    /// Seconds allowed for establishing each HTTP connection.
    pub connect_timeout_secs: Option<u64>,
}

impl FetchEnvCfg {
    /// Loads configuration from environment variables without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable cannot be parsed.
    pub fn load() -> ConfigResult<Self> {
        let args = [OsString::from("prisma-engine-fetch")];
        Self::load_from_iter(args).map_err(|err| ConfigError::from(eyre!(err)))
    }

    /// Converts the overrides into a [`FetchConfig`], keeping defaults for
    /// anything unset or blank.
    #[must_use]
    pub fn to_fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig::default();
        if let Some(url) = non_blank(self.cli_url.as_deref()) {
            config.cli_url = url.to_owned();
        }
        if let Some(url) = non_blank(self.engine_url.as_deref()) {
            config.engine_url = url.to_owned();
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Resolves the platform, detecting only when no override is complete.
    #[must_use]
    pub fn to_platform(&self) -> Platform {
        match (
            non_blank(self.platform.as_deref()),
            non_blank(self.binary_platform.as_deref()),
        ) {
            (Some(name), Some(binary_name)) => Platform::new(name, binary_name),
            (name, binary_name) => {
                let detected = Platform::detect();
                Platform::new(
                    name.unwrap_or_else(|| detected.name()),
                    binary_name.unwrap_or_else(|| detected.binary_name()),
                )
            }
        }
    }

    /// Returns the configured binary directory, or the versioned directory
    /// beneath `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when `root` cannot be resolved.
    pub fn binary_dir_or(&self, root: CacheRoot) -> PathResult<Utf8PathBuf> {
        match &self.binary_dir {
            Some(dir) if !dir.as_str().trim().is_empty() => Ok(dir.clone()),
            _ => root.resolve(PRISMA_VERSION),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
