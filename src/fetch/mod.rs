//! Cache-checked fetching of the Prisma CLI and engines.
//!
//! [`BinaryFetcher`] owns the URL templates and versions for one fetch
//! session. Each artifact is looked up at its deterministic path first; only a
//! missing entry triggers a download.

mod download;
mod template;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, eyre};
use tracing::{debug, info_span};

use crate::artifact::Artifact;
use crate::error::{DownloadError, DownloadErrorKind, Result, ValidationError};
use crate::fs::entry_exists;
use crate::observability::{CACHE_LOG_TARGET, LOG_TARGET};
use crate::platform::Platform;
use crate::{ENGINE_VERSION, PRISMA_VERSION, cache::ArtifactLock};

/// Object store holding the CLI builds: `(package, version, platform)`.
pub const DEFAULT_CLI_URL: &str =
    "https://prisma-photongo.s3-eu-west-1.amazonaws.com/%s-%s-%s.gz";

/// Object store holding the engine builds: `(engine version, binary name, artifact)`.
pub const DEFAULT_ENGINE_URL: &str =
    "https://prisma-builds.s3-eu-west-1.amazonaws.com/master/%s/%s/%s.gz";

/// Package name substituted into the CLI template.
pub const CLI_PACKAGE: &str = "prisma-cli";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholders each template must carry.
const TEMPLATE_ARITY: usize = 3;

/// Sources and versions used by a [`BinaryFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// CLI URL template with three `%s` placeholders.
    pub cli_url: String,
    /// Engine URL template with three `%s` placeholders.
    pub engine_url: String,
    /// CLI release substituted into the CLI template.
    pub cli_version: String,
    /// Engine commit substituted into the engine template.
    pub engine_version: String,
    /// Upper bound on establishing each HTTP connection.
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cli_url: DEFAULT_CLI_URL.to_owned(),
            engine_url: DEFAULT_ENGINE_URL.to_owned(),
            cli_version: PRISMA_VERSION.to_owned(),
            engine_version: ENGINE_VERSION.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Fetches artifacts for one platform into caller-chosen directories.
#[derive(Debug)]
pub struct BinaryFetcher {
    config: FetchConfig,
    platform: Platform,
    agent: ureq::Agent,
}

impl BinaryFetcher {
    /// Creates a fetcher after validating the URL templates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TemplatePlaceholders`] when either template
    /// does not hold exactly three `%s` placeholders.
    pub fn new(config: FetchConfig, platform: Platform) -> Result<Self> {
        template::validate("cli", &config.cli_url, TEMPLATE_ARITY)?;
        template::validate("engine", &config.engine_url, TEMPLATE_ARITY)?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .build();
        Ok(Self {
            config,
            platform,
            agent,
        })
    }

    /// Returns the configuration this fetcher was built with.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Returns the platform used for naming.
    #[must_use]
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Computes `target_dir/prisma-<artifact>-<binary_name>`.
    #[must_use]
    pub fn artifact_path(
        target_dir: &Utf8Path,
        artifact: Artifact,
        binary_name: &str,
    ) -> Utf8PathBuf {
        target_dir.join(artifact.file_name(binary_name))
    }

    /// Computes where the CLI lives inside `target_dir`.
    #[must_use]
    pub fn cli_path(&self, target_dir: &Utf8Path) -> Utf8PathBuf {
        Self::artifact_path(target_dir, Artifact::Cli, self.platform.name())
    }

    /// Builds the remote URL of the CLI for this platform.
    #[must_use]
    pub fn cli_url(&self) -> String {
        template::fill(
            &self.config.cli_url,
            &[CLI_PACKAGE, &self.config.cli_version, self.platform.name()],
        )
    }

    /// Builds the remote URL of an artifact in the engine store.
    #[must_use]
    pub fn engine_url(&self, artifact: Artifact, binary_name: &str) -> String {
        template::fill(
            &self.config.engine_url,
            &[&self.config.engine_version, binary_name, artifact.remote_name()],
        )
    }

    /// Ensures `artifact` built for `binary_name` is present in `target_dir`.
    ///
    /// An existing entry at the destination counts as cached and is returned
    /// without any network traffic or content check.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FetchError::Download`] with the source URL and
    /// destination path in its context when the download fails.
    pub fn fetch_artifact(
        &self,
        target_dir: &Utf8Path,
        artifact: Artifact,
        binary_name: &str,
    ) -> Result<Utf8PathBuf> {
        let to = Self::artifact_path(target_dir, artifact, binary_name);
        let url = self.engine_url(artifact, binary_name);
        self.ensure_installed(artifact, &url, to)
    }

    /// Ensures an engine built for the detected SSL variant is present.
    ///
    /// # Errors
    ///
    /// See [`BinaryFetcher::fetch_artifact`].
    pub fn fetch_engine(&self, target_dir: &Utf8Path, artifact: Artifact) -> Result<Utf8PathBuf> {
        self.fetch_artifact(target_dir, artifact, self.platform.binary_name())
    }

    /// Ensures the CLI is present in `target_dir`.
    ///
    /// # Errors
    ///
    /// See [`BinaryFetcher::fetch_artifact`].
    pub fn fetch_cli(&self, target_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let to = self.cli_path(target_dir);
        let url = self.cli_url();
        self.ensure_installed(Artifact::Cli, &url, to)
    }

    /// Ensures the CLI and every engine are present in `target_dir`.
    ///
    /// Artifacts are fetched one at a time; the first failure is returned and
    /// the artifacts fetched before it are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTargetDir`] or
    /// [`ValidationError::RelativeTargetDir`] before any I/O when the
    /// directory is unusable, otherwise the first download failure.
    pub fn fetch_all_engines(&self, target_dir: &Utf8Path) -> Result<()> {
        validate_target_dir(target_dir)?;
        let _span =
            info_span!(target: LOG_TARGET, "fetch_all_engines", dir = %target_dir).entered();

        self.fetch_cli(target_dir)?;
        for artifact in Artifact::ENGINES {
            self.fetch_engine(target_dir, artifact)?;
        }
        Ok(())
    }

    fn ensure_installed(
        &self,
        artifact: Artifact,
        url: &str,
        to: Utf8PathBuf,
    ) -> Result<Utf8PathBuf> {
        debug!(target: CACHE_LOG_TARGET, artifact = %artifact, "checking artifact");
        if is_cached(&to)? {
            return Ok(to);
        }

        let _lock = lock_for(&to).map_err(|err| with_transfer_context(err, url, &to))?;
        // Another process may have finished the same artifact while we waited.
        if is_cached(&to)? {
            return Ok(to);
        }

        debug!(target: CACHE_LOG_TARGET, artifact = %artifact, "artifact missing, downloading");
        download::download(&self.agent, url, &to)
            .map_err(|err| with_transfer_context(err, url, &to))?;
        debug!(target: CACHE_LOG_TARGET, artifact = %artifact, path = %to, "artifact fetched");
        Ok(to)
    }
}

fn with_transfer_context(err: DownloadError, url: &str, to: &Utf8Path) -> DownloadError {
    err.wrap(format!("could not download {url} to {to}"))
}

/// Rejects empty or relative target directories.
fn validate_target_dir(target_dir: &Utf8Path) -> std::result::Result<(), ValidationError> {
    if target_dir.as_str().is_empty() {
        return Err(ValidationError::EmptyTargetDir);
    }
    if !target_dir.is_absolute() {
        return Err(ValidationError::RelativeTargetDir(target_dir.to_path_buf()));
    }
    Ok(())
}

fn is_cached(to: &Utf8Path) -> Result<bool> {
    let cached = entry_exists(to)
        .map_err(|report| DownloadError::new(DownloadErrorKind::Filesystem, report))?;
    if cached {
        debug!(target: CACHE_LOG_TARGET, path = %to, "artifact is cached");
    }
    Ok(cached)
}

fn lock_for(to: &Utf8Path) -> std::result::Result<ArtifactLock, DownloadError> {
    let (Some(dir), Some(file_name)) = (to.parent(), to.file_name()) else {
        return Err(DownloadError::new(
            DownloadErrorKind::Filesystem,
            eyre!("{to} has no parent directory"),
        ));
    };
    crate::fs::ensure_dir_exists(dir)?;
    ArtifactLock::acquire(dir, file_name)
        .with_context(|| format!("could not lock {to}"))
        .map_err(DownloadError::from)
}

#[cfg(test)]
mod tests;
