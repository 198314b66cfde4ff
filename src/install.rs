//! Entry point shared by the binary: resolve configuration, then fetch.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::cache::CacheRoot;
use crate::error::Result;
use crate::observability::LOG_TARGET;
use crate::{Artifact, BinaryFetcher, FetchEnvCfg};

/// What to fetch and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Explicit destination; takes precedence over `PRISMA_BINARY_DIR`.
    pub dir: Option<Utf8PathBuf>,
    /// Root used when no directory is configured.
    pub root: CacheRoot,
    /// Single artifact to fetch; `None` fetches the CLI and every engine.
    pub artifact: Option<Artifact>,
}

/// Loads [`FetchEnvCfg`] from the environment and fetches the requested
/// artifacts, returning the directory that now holds them.
///
/// # Examples
/// ```no_run
/// use prisma_engine_fetch::{InstallOptions, run};
///
/// fn main() -> Result<(), prisma_engine_fetch::FetchError> {
///     let dir = run(&InstallOptions::default())?;
///     println!("binaries installed in {dir}");
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// Returns configuration, path, validation, or download failures; the first
/// failing artifact aborts the run.
pub fn run(options: &InstallOptions) -> Result<Utf8PathBuf> {
    if let Err(err) = color_eyre::install() {
        debug!(target: LOG_TARGET, "color_eyre already installed: {err}");
    }

    let cfg = FetchEnvCfg::load()?;
    install_with(&cfg, options)
}

/// Fetches the requested artifacts using an already loaded configuration.
///
/// # Errors
///
/// See [`run`].
pub fn install_with(cfg: &FetchEnvCfg, options: &InstallOptions) -> Result<Utf8PathBuf> {
    let dir = match &options.dir {
        Some(dir) => dir.clone(),
        None => cfg.binary_dir_or(options.root)?,
    };
    let fetcher = BinaryFetcher::new(cfg.to_fetch_config(), cfg.to_platform())?;
    fetch_into(&fetcher, &dir, options.artifact)?;
    info!(target: LOG_TARGET, dir = %dir, "prisma binaries ready");
    Ok(dir)
}

fn fetch_into(fetcher: &BinaryFetcher, dir: &Utf8Path, artifact: Option<Artifact>) -> Result<()> {
    match artifact {
        None => fetcher.fetch_all_engines(dir),
        Some(Artifact::Cli) => fetcher.fetch_cli(dir).map(drop),
        Some(engine) => fetcher.fetch_engine(dir, engine).map(drop),
    }
}
