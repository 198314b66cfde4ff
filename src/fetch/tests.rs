//! Tests for cache-checked artifact fetching.

use super::*;
use crate::FetchError;
use crate::test_support::gzip_bytes;
use httpmock::prelude::*;
use rstest::{fixture, rstest};
use tempfile::{TempDir, tempdir};

const ENGINE_COMMIT: &str = "deadbeef";
const CLI_RELEASE: &str = "2.0.0-test";

struct Harness {
    server: MockServer,
    fetcher: BinaryFetcher,
    temp: TempDir,
}

impl Harness {
    fn dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.temp.path().to_path_buf()).expect("utf8 path")
    }
}

#[fixture]
fn harness() -> Harness {
    let server = MockServer::start();
    let config = FetchConfig {
        cli_url: format!("{}/cli/%s-%s-%s.gz", server.base_url()),
        engine_url: format!("{}/master/%s/%s/%s.gz", server.base_url()),
        cli_version: CLI_RELEASE.into(),
        engine_version: ENGINE_COMMIT.into(),
        ..FetchConfig::default()
    };
    let fetcher =
        BinaryFetcher::new(config, Platform::new("linux", "debian-openssl-1.1.x")).expect("fetcher");
    Harness {
        server,
        fetcher,
        temp: tempdir().expect("tempdir"),
    }
}

#[rstest]
fn artifact_path_is_deterministic() {
    let dir = Utf8Path::new("/opt/prisma");
    let first = BinaryFetcher::artifact_path(dir, Artifact::MigrationEngine, "darwin");
    let second = BinaryFetcher::artifact_path(dir, Artifact::MigrationEngine, "darwin");
    assert_eq!(first, second);
    assert_eq!(first.as_str(), "/opt/prisma/prisma-migration-engine-darwin");
}

#[rstest]
fn urls_substitute_versions_and_platform(harness: Harness) {
    assert_eq!(
        harness.fetcher.cli_url(),
        harness.server.url("/cli/prisma-cli-2.0.0-test-linux.gz")
    );
    assert_eq!(
        harness.fetcher.engine_url(Artifact::QueryEngine, "darwin"),
        harness.server.url("/master/deadbeef/darwin/prisma.gz")
    );
    assert_eq!(
        harness.fetcher.engine_url(Artifact::IntrospectionEngine, "darwin"),
        harness.server.url("/master/deadbeef/darwin/introspection-engine.gz")
    );
}

#[rstest]
fn default_config_points_at_the_public_stores() {
    let fetcher = BinaryFetcher::new(FetchConfig::default(), Platform::new("darwin", "darwin"))
        .expect("default templates are valid");
    assert_eq!(
        fetcher.cli_url(),
        format!(
            "https://prisma-photongo.s3-eu-west-1.amazonaws.com/prisma-cli-{PRISMA_VERSION}-darwin.gz"
        )
    );
    assert_eq!(
        fetcher.engine_url(Artifact::QueryEngine, "darwin"),
        format!("https://prisma-builds.s3-eu-west-1.amazonaws.com/master/{ENGINE_VERSION}/darwin/prisma.gz")
    );
}

#[rstest]
fn malformed_template_is_rejected() {
    let config = FetchConfig {
        engine_url: "https://mirror.example/%s.gz".into(),
        ..FetchConfig::default()
    };
    let err = BinaryFetcher::new(config, Platform::new("linux", "linux")).expect_err("bad template");
    assert!(matches!(
        err,
        FetchError::Validation(ValidationError::TemplatePlaceholders { name: "engine", found: 1, .. })
    ));
}

#[rstest]
fn cached_artifact_skips_the_network(harness: Harness) {
    let mock = harness.server.mock(|when, then| {
        when.method(GET);
        then.status(200).body(gzip_bytes(b"unexpected"));
    });
    let dir = harness.dir();
    let existing = dir.join("prisma-query-engine-linux");
    std::fs::write(&existing, b"").expect("seed empty cache entry");

    let path = harness
        .fetcher
        .fetch_artifact(&dir, Artifact::QueryEngine, "linux")
        .expect("cache hit");

    assert_eq!(path, existing);
    mock.assert_hits(0);
    assert_eq!(std::fs::read(&existing).expect("read entry"), b"");
}

#[rstest]
fn missing_artifact_is_downloaded_once(harness: Harness) {
    let mock = harness.server.mock(|when, then| {
        when.method(GET).path("/master/deadbeef/linux/prisma.gz");
        then.status(200).body(gzip_bytes(b"ENGINE_BINARY_CONTENT"));
    });
    let dir = harness.dir();

    let first = harness
        .fetcher
        .fetch_artifact(&dir, Artifact::QueryEngine, "linux")
        .expect("first fetch");
    let second = harness
        .fetcher
        .fetch_artifact(&dir, Artifact::QueryEngine, "linux")
        .expect("second fetch");

    assert_eq!(first, dir.join("prisma-query-engine-linux"));
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&first).expect("read engine"), b"ENGINE_BINARY_CONTENT");
    mock.assert_hits(1);
}

#[rstest]
#[case(404)]
#[case(500)]
fn failed_status_leaves_no_file(harness: Harness, #[case] status: u16) {
    harness.server.mock(|when, then| {
        when.method(GET);
        then.status(status).body("NoSuchKey");
    });
    let dir = harness.dir();

    let err = harness
        .fetcher
        .fetch_artifact(&dir, Artifact::MigrationEngine, "linux")
        .expect_err("status must fail");

    assert_eq!(err.download_kind(), Some(DownloadErrorKind::HttpStatus(status)));
    assert!(!dir.join("prisma-migration-engine-linux").exists());
}

#[rstest]
fn download_errors_name_the_url_and_destination(harness: Harness) {
    harness.server.mock(|when, then| {
        when.method(GET);
        then.status(404);
    });
    let dir = harness.dir();

    let FetchError::Download(err) = harness
        .fetcher
        .fetch_artifact(&dir, Artifact::MigrationEngine, "linux")
        .expect_err("status must fail")
    else {
        panic!("expected a download error");
    };

    let message = err.to_string();
    assert!(
        message.contains("/master/deadbeef/linux/migration-engine.gz"),
        "message: {message}"
    );
    assert!(message.contains("prisma-migration-engine-linux"), "message: {message}");
}

#[rstest]
fn cli_uses_its_own_template_and_file_name(harness: Harness) {
    let mock = harness.server.mock(|when, then| {
        when.method(GET).path("/cli/prisma-cli-2.0.0-test-linux.gz");
        then.status(200).body(gzip_bytes(b"cli"));
    });
    let dir = harness.dir();

    let path = harness.fetcher.fetch_cli(&dir).expect("fetch cli");

    mock.assert();
    assert_eq!(path, dir.join("prisma-cli-linux"));
    assert_eq!(std::fs::read(&path).expect("read cli"), b"cli");
}

#[rstest]
#[case("")]
#[case("relative/dir")]
fn fetch_all_engines_rejects_unusable_directories(harness: Harness, #[case] dir: &str) {
    let mock = harness.server.mock(|when, then| {
        when.method(GET);
        then.status(200).body(gzip_bytes(b"unexpected"));
    });

    let err = harness
        .fetcher
        .fetch_all_engines(Utf8Path::new(dir))
        .expect_err("invalid directory");

    assert!(matches!(err, FetchError::Validation(_)), "got {err:?}");
    mock.assert_hits(0);
    if !dir.is_empty() {
        assert!(!Utf8Path::new(dir).exists(), "no directory may be created");
    }
}

#[rstest]
fn fetch_all_engines_stops_at_first_failure(harness: Harness) {
    let cli = harness.server.mock(|when, then| {
        when.method(GET).path("/cli/prisma-cli-2.0.0-test-linux.gz");
        then.status(200).body(gzip_bytes(b"cli"));
    });
    let query = harness.server.mock(|when, then| {
        when.method(GET)
            .path("/master/deadbeef/debian-openssl-1.1.x/prisma.gz");
        then.status(200).body(gzip_bytes(b"query"));
    });
    let migration = harness.server.mock(|when, then| {
        when.method(GET)
            .path("/master/deadbeef/debian-openssl-1.1.x/migration-engine.gz");
        then.status(500).body("boom");
    });
    let introspection = harness.server.mock(|when, then| {
        when.method(GET)
            .path("/master/deadbeef/debian-openssl-1.1.x/introspection-engine.gz");
        then.status(200).body(gzip_bytes(b"introspection"));
    });
    let dir = harness.dir();

    let err = harness
        .fetcher
        .fetch_all_engines(&dir)
        .expect_err("migration engine fails");

    assert_eq!(err.download_kind(), Some(DownloadErrorKind::HttpStatus(500)));
    cli.assert_hits(1);
    query.assert_hits(1);
    migration.assert_hits(1);
    introspection.assert_hits(0);
    assert!(dir.join("prisma-query-engine-debian-openssl-1.1.x").exists());
    assert!(!dir.join("prisma-introspection-engine-debian-openssl-1.1.x").exists());
}

#[cfg(unix)]
#[rstest]
fn lock_files_stay_out_of_the_artifact_listing(harness: Harness) {
    harness.server.mock(|when, then| {
        when.method(GET).path("/master/deadbeef/linux/prisma.gz");
        then.status(200).body(gzip_bytes(b"ENGINE_BINARY_CONTENT"));
    });
    let dir = harness.dir();

    harness
        .fetcher
        .fetch_artifact(&dir, Artifact::QueryEngine, "linux")
        .expect("fetch");

    let mut entries: Vec<String> = std::fs::read_dir(&dir)
        .expect("list target dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, [".locks", "prisma-query-engine-linux"]);
    assert!(dir.join(".locks/prisma-query-engine-linux.lock").is_file());
}
