//! Identifies the running platform for artifact naming.
//!
//! The CLI is published per operating system, whereas engines are also split
//! by Linux distribution family and the OpenSSL release they link against.

use std::fs;
use std::process::Command;

use tracing::debug;

use crate::observability::LOG_TARGET;

/// OpenSSL release assumed when `openssl version` cannot be parsed.
const DEFAULT_OPENSSL: &str = "1.1.x";

const OS_RELEASE: &str = "/etc/os-release";

/// Platform tag and SSL-variant binary name for the current host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    name: String,
    binary_name: String,
}

impl Platform {
    /// Builds a platform from explicit values, bypassing detection.
    #[must_use]
    pub fn new(name: impl Into<String>, binary_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binary_name: binary_name.into(),
        }
    }

    /// Detects the platform of the running process.
    ///
    /// On Linux this probes `/etc/os-release` and `openssl version`; failures
    /// fall back to `debian` and OpenSSL `1.1.x`.
    #[must_use]
    pub fn detect() -> Self {
        let name = os_name();
        let binary_name = if name == "linux" {
            let distro = fs::read_to_string(OS_RELEASE)
                .map_or(Distro::Debian, |content| parse_distro(&content));
            let ssl = probe_openssl();
            format!("{}-openssl-{ssl}", distro.as_str())
        } else {
            name.to_owned()
        };
        debug!(
            target: LOG_TARGET,
            platform = name,
            binary_name = %binary_name,
            "detected platform"
        );
        Self::new(name, binary_name)
    }

    /// Returns the operating system tag (`linux`, `darwin`, `windows`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the SSL-variant suffix used for engine URLs and file names.
    #[must_use]
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }
}

/// Maps the Rust target OS onto the tag used by the artifact store.
#[must_use]
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Linux distribution families that receive distinct engine builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Distro {
    Debian,
    Rhel,
}

impl Distro {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Rhel => "rhel",
        }
    }
}

/// Classifies `/etc/os-release` content by its `ID` and `ID_LIKE` fields.
fn parse_distro(os_release: &str) -> Distro {
    let is_rhel = os_release
        .lines()
        .filter_map(|line| {
            line.strip_prefix("ID_LIKE=")
                .or_else(|| line.strip_prefix("ID="))
        })
        .flat_map(|value| value.trim_matches('"').split_whitespace())
        .any(|id| matches!(id, "rhel" | "centos" | "fedora"));
    if is_rhel { Distro::Rhel } else { Distro::Debian }
}

fn probe_openssl() -> String {
    match Command::new("openssl").args(["version", "-v"]).output() {
        Ok(output) => parse_openssl_version(&String::from_utf8_lossy(&output.stdout)),
        Err(err) => {
            debug!(
                target: LOG_TARGET,
                error = %err,
                "openssl not found, assuming {DEFAULT_OPENSSL}"
            );
            DEFAULT_OPENSSL.to_owned()
        }
    }
}

/// Reduces `OpenSSL 1.1.1f  31 Mar 2020` to `1.1.x`.
fn parse_openssl_version(output: &str) -> String {
    output
        .trim_start()
        .strip_prefix("OpenSSL ")
        .and_then(|rest| {
            let mut parts = rest.split('.');
            let major = parts.next()?;
            let minor = parts.next()?;
            let numeric = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
            (numeric(major) && numeric(minor)).then(|| format!("{major}.{minor}.x"))
        })
        .unwrap_or_else(|| DEFAULT_OPENSSL.to_owned())
}
