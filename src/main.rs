//! Downloads the Prisma CLI and engines for the current platform into a
//! local directory, skipping anything already present.
//!
//! Remote stores and platform detection can be overridden through the
//! `PRISMA_*` environment variables read by
//! [`FetchEnvCfg`](prisma_engine_fetch::FetchEnvCfg). The binary exits with
//! status code `0` on success and `1` on error.

use camino::Utf8PathBuf;
use clap::Parser;
use prisma_engine_fetch::{Artifact, InstallOptions, cache::CacheRoot};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "prisma-engine-fetch", version, about)]
struct Cli {
    /// Directory receiving the binaries (defaults to the user cache).
    #[arg(long)]
    dir: Option<Utf8PathBuf>,
    /// Use the OS temp directory instead of the user cache.
    #[arg(long)]
    temp: bool,
    /// Fetch a single artifact: cli, query-engine, migration-engine, or introspection-engine.
    #[arg(long)]
    artifact: Option<Artifact>,
    /// Log cache hits, misses, and transfers.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> color_eyre::eyre::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let options = InstallOptions {
        dir: cli.dir,
        root: if cli.temp {
            CacheRoot::Temp
        } else {
            CacheRoot::User
        },
        artifact: cli.artifact,
    };
    prisma_engine_fetch::run(&options).map_err(|err| color_eyre::eyre::eyre!(err))?;
    Ok(())
}
