//! Domain error types for fetching Prisma binaries.

use camino::Utf8PathBuf;
use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return a [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;

/// Result alias for download-specific fallible operations.
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Result alias for path resolution fallible operations.
pub type PathResult<T> = std::result::Result<T, PathError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Indicates the caller supplied invalid input; no I/O was attempted.
    #[error("invalid fetch request")]
    Validation(#[from] ValidationError),
    /// Indicates downloading or installing an artifact failed.
    #[error("artifact download failed")]
    Download(#[from] DownloadError),
    /// Indicates a standard directory could not be resolved.
    #[error("path resolution failed")]
    Path(#[from] PathError),
    /// Indicates configuration parsing failed.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Rejected inputs, reported before any network or filesystem work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The target directory was empty.
    #[error("target directory must be provided")]
    EmptyTargetDir,
    /// The target directory was not an absolute path.
    #[error("target directory must be absolute (received {0})")]
    RelativeTargetDir(Utf8PathBuf),
    /// The artifact name is not one of the fixed set.
    #[error("unknown artifact '{0}'; expected cli, query-engine, migration-engine, or introspection-engine")]
    UnknownArtifact(String),
    /// A URL template does not hold the expected number of `%s` placeholders.
    #[error("{name} template must contain {expected} '%s' placeholders (found {found}): {template}")]
    TemplatePlaceholders {
        /// Which template was rejected.
        name: &'static str,
        /// The offending template.
        template: String,
        /// Placeholders required by the template's substitutions.
        expected: usize,
        /// Placeholders actually present.
        found: usize,
    },
}

/// Categorises download failures so callers can branch on structured errors.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DownloadErrorKind {
    /// Connection, DNS, or transport failure.
    #[default]
    Network,
    /// The server answered with a status other than `200 OK`.
    HttpStatus(u16),
    /// Creating directories, writing, or renaming files failed.
    Filesystem,
    /// The response body was not a complete, valid gzip stream, including an
    /// empty or truncated body.
    Decompress,
}

/// Captures download-specific failures.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct DownloadError {
    kind: DownloadErrorKind,
    #[source]
    report: Report,
}

impl DownloadError {
    /// Constructs a new download error with the provided kind and diagnostic
    /// report.
    #[must_use]
    pub const fn new(kind: DownloadErrorKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Returns the semantic category for this download failure.
    #[must_use]
    pub const fn kind(&self) -> DownloadErrorKind {
        self.kind
    }

    /// Extracts the underlying diagnostic report.
    pub fn into_report(self) -> Report {
        self.report
    }

    /// Prepends context to the diagnostic chain while keeping the kind.
    #[must_use]
    pub fn wrap(self, context: String) -> Self {
        Self {
            kind: self.kind,
            report: self.report.wrap_err(context),
        }
    }
}

impl From<Report> for DownloadError {
    fn from(report: Report) -> Self {
        Self::new(DownloadErrorKind::Filesystem, report)
    }
}

/// Captures path resolution failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PathError(#[from] Report);

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);

impl FetchError {
    /// Returns the download failure category when this error came from a
    /// download.
    #[must_use]
    pub const fn download_kind(&self) -> Option<DownloadErrorKind> {
        match self {
            Self::Download(err) => Some(err.kind()),
            _ => None,
        }
    }
}
