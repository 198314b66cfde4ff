//! The fixed set of downloadable Prisma executables.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// One of the prebuilt executables published for each platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// The Prisma command-line interface.
    Cli,
    /// Engine serving queries for the generated client.
    QueryEngine,
    /// Engine applying schema migrations.
    MigrationEngine,
    /// Engine introspecting existing databases.
    IntrospectionEngine,
}

impl Artifact {
    /// Engines fetched by [`crate::BinaryFetcher::fetch_all_engines`], in order.
    pub const ENGINES: [Self; 3] = [
        Self::QueryEngine,
        Self::MigrationEngine,
        Self::IntrospectionEngine,
    ];

    /// Returns the canonical name used in local file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::QueryEngine => "query-engine",
            Self::MigrationEngine => "migration-engine",
            Self::IntrospectionEngine => "introspection-engine",
        }
    }

    /// Returns the object name used by the remote engine store.
    ///
    /// The query engine is published as `prisma`; every other artifact keeps
    /// its canonical name.
    #[must_use]
    pub const fn remote_name(self) -> &'static str {
        match self {
            Self::QueryEngine => "prisma",
            other => other.as_str(),
        }
    }

    /// Returns the local file name `prisma-<artifact>-<binary_name>`.
    #[must_use]
    pub fn file_name(self, binary_name: &str) -> String {
        format!("prisma-{}-{binary_name}", self.as_str())
    }

    /// Reports whether this artifact is one of the engines.
    #[must_use]
    pub const fn is_engine(self) -> bool {
        !matches!(self, Self::Cli)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Artifact {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(Self::Cli),
            "query-engine" => Ok(Self::QueryEngine),
            "migration-engine" => Ok(Self::MigrationEngine),
            "introspection-engine" => Ok(Self::IntrospectionEngine),
            other => Err(ValidationError::UnknownArtifact(other.to_owned())),
        }
    }
}
