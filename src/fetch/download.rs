//! Streams a gzip-compressed artifact over HTTP and installs it atomically.

use std::io::{ErrorKind, Read, Write};
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, eyre};
use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

use crate::error::{DownloadError, DownloadErrorKind, DownloadResult};
use crate::fs::{create_executable, ensure_dir_exists, remove_file_if_present, rename_into_place};
use crate::observability::DOWNLOAD_LOG_TARGET as LOG_TARGET;

/// Suffix of the sibling file that receives the decompressed stream.
const STAGING_SUFFIX: &str = ".tmp";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Downloads `url`, gunzips the body, and installs it at `to`.
///
/// The body is staged in `<to>.tmp` and renamed over `to` only after the
/// whole stream decoded, so `to` never holds a partial file.
pub(crate) fn download(agent: &ureq::Agent, url: &str, to: &Utf8Path) -> DownloadResult<()> {
    if let Some(parent) = to.parent() {
        ensure_dir_exists(parent)
            .with_context(|| format!("could not create parent directory of {to}"))?;
    }

    let started = Instant::now();
    let response = request(agent, url)?;
    let staged = staged_path(to);

    let installed = write_staged(response, url, &staged).and_then(|bytes| {
        rename_into_place(&staged, to)?;
        Ok(bytes)
    });
    match installed {
        Ok(bytes) => {
            debug!(
                target: LOG_TARGET,
                url = %url,
                path = %to,
                bytes,
                elapsed = ?started.elapsed(),
                "artifact installed"
            );
            Ok(())
        }
        Err(err) => {
            discard_staged(&staged);
            Err(err)
        }
    }
}

/// Returns the staging path `<to>.tmp`.
pub(crate) fn staged_path(to: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{to}{STAGING_SUFFIX}"))
}

fn request(agent: &ureq::Agent, url: &str) -> DownloadResult<ureq::Response> {
    debug!(target: LOG_TARGET, url = %url, "requesting artifact");
    match agent.get(url).call() {
        Ok(response) if response.status() == 200 => Ok(response),
        Ok(response) | Err(ureq::Error::Status(_, response)) => Err(status_error(url, response)),
        Err(ureq::Error::Transport(transport)) => Err(DownloadError::new(
            DownloadErrorKind::Network,
            eyre!("could not get {url}: {transport}"),
        )),
    }
}

/// Builds an error carrying the status code and the response body for diagnostics.
fn status_error(url: &str, response: ureq::Response) -> DownloadError {
    let code = response.status();
    let body = response.into_string().unwrap_or_else(|err| {
        debug!(target: LOG_TARGET, error = %err, "could not read error body");
        String::new()
    });
    DownloadError::new(
        DownloadErrorKind::HttpStatus(code),
        eyre!("received code {code} from {url}: {body}"),
    )
}

/// Decodes the response body into `staged`, returning the decompressed size.
fn write_staged(response: ureq::Response, url: &str, staged: &Utf8Path) -> DownloadResult<u64> {
    let mut file = create_executable(staged)?;
    // Object stores may serve several concatenated gzip members.
    let mut decoder = MultiGzDecoder::new(response.into_reader());
    let mut buffer = vec![0_u8; COPY_BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let read = match decoder.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(read_error(url, &err)),
        };
        let chunk = buffer.get(..read).unwrap_or_default();
        file.write_all(chunk)
            .with_context(|| format!("could not write {staged}"))?;
        written += chunk.len() as u64;
    }

    file.sync_all()
        .with_context(|| format!("could not flush {staged}"))?;
    Ok(written)
}

/// Classifies a failed body read: malformed gzip versus a broken transfer.
///
/// A body that ends before the gzip stream is complete (empty or truncated)
/// is reported as [`DownloadErrorKind::Decompress`].
fn read_error(url: &str, err: &std::io::Error) -> DownloadError {
    match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::InvalidData => DownloadError::new(
            DownloadErrorKind::Decompress,
            eyre!("could not decompress {url}: {err}"),
        ),
        ErrorKind::UnexpectedEof => DownloadError::new(
            DownloadErrorKind::Decompress,
            eyre!("could not decompress {url}: gzip stream is truncated ({err})"),
        ),
        _ => DownloadError::new(
            DownloadErrorKind::Network,
            eyre!("could not copy {url}: {err}"),
        ),
    }
}

fn discard_staged(staged: &Utf8Path) {
    if let Err(err) = remove_file_if_present(staged) {
        warn!(
            target: LOG_TARGET,
            path = %staged,
            error = %err,
            "could not remove staged download"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gzip_bytes;
    use httpmock::prelude::*;
    use rstest::rstest;
    use tempfile::tempdir;

    fn utf8_root(temp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 path")
    }

    #[test]
    fn staged_path_is_a_sibling() {
        assert_eq!(
            staged_path(Utf8Path::new("/bin/prisma-cli-linux")),
            "/bin/prisma-cli-linux.tmp"
        );
    }

    #[test]
    fn download_creates_parents_and_decompresses() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/artifact.gz");
            then.status(200).body(gzip_bytes(b"#!/bin/sh\necho prisma\n"));
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("nested/dir/prisma-cli-linux");

        download(&ureq::agent(), &server.url("/artifact.gz"), &to).expect("download");

        mock.assert();
        assert_eq!(
            std::fs::read(&to).expect("read installed"),
            b"#!/bin/sh\necho prisma\n"
        );
        assert!(!staged_path(&to).exists(), "staging file is renamed away");
    }

    #[test]
    fn non_ok_status_reports_code_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.gz");
            then.status(403).body("AccessDenied");
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");

        let err = download(&ureq::agent(), &server.url("/missing.gz"), &to)
            .expect_err("403 must fail");

        assert_eq!(err.kind(), DownloadErrorKind::HttpStatus(403));
        let message = err.to_string();
        assert!(message.contains("403"), "message: {message}");
        assert!(message.contains("AccessDenied"), "message: {message}");
        assert!(!to.exists());
        assert!(!staged_path(&to).exists());
    }

    #[test]
    fn non_gzip_body_is_a_decompress_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/plain.gz");
            then.status(200).body("definitely not gzip");
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");

        let err = download(&ureq::agent(), &server.url("/plain.gz"), &to)
            .expect_err("plain body must fail");

        assert_eq!(err.kind(), DownloadErrorKind::Decompress);
        assert!(!to.exists());
        assert!(!staged_path(&to).exists(), "staging file is cleaned up");
    }

    #[test]
    fn concatenated_gzip_members_are_all_decoded() {
        let server = MockServer::start();
        let body = [gzip_bytes(b"PART_ONE_"), gzip_bytes(b"PART_TWO")].concat();
        server.mock(|when, then| {
            when.method(GET).path("/multi.gz");
            then.status(200).body(body);
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");

        download(&ureq::agent(), &server.url("/multi.gz"), &to).expect("download");

        assert_eq!(
            std::fs::read(&to).expect("read installed"),
            b"PART_ONE_PART_TWO"
        );
    }

    #[rstest]
    #[case::empty(Vec::new())]
    #[case::cut_in_header(gzip_bytes(b"payload").get(..5).unwrap_or_default().to_vec())]
    fn incomplete_gzip_body_is_a_decompress_error(#[case] body: Vec<u8>) {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/short.gz");
            then.status(200).body(body);
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");

        let err = download(&ureq::agent(), &server.url("/short.gz"), &to)
            .expect_err("incomplete body must fail");

        assert_eq!(err.kind(), DownloadErrorKind::Decompress);
        assert!(err.to_string().contains("truncated"), "message: {err}");
        assert!(!to.exists());
        assert!(!staged_path(&to).exists(), "staging file is cleaned up");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");

        let err = download(&ureq::agent(), "http://127.0.0.1:9/artifact.gz", &to)
            .expect_err("closed port must fail");

        assert_eq!(err.kind(), DownloadErrorKind::Network);
        assert!(!to.exists());
    }

    #[test]
    fn existing_destination_is_replaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/artifact.gz");
            then.status(200).body(gzip_bytes(b"fresh"));
        });
        let temp = tempdir().expect("tempdir");
        let to = utf8_root(&temp).join("prisma-cli-linux");
        std::fs::write(&to, b"stale").expect("seed stale file");

        download(&ureq::agent(), &server.url("/artifact.gz"), &to).expect("download");

        assert_eq!(std::fs::read(&to).expect("read installed"), b"fresh");
    }
}
