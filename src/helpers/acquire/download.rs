//! Streaming downloads
//!
//! A [`DownloadTask`] names one file to fetch. When it carries a checksum
//! reference, the reference's file name must match the URL's last path
//! segment; that is checked when the task is built, so a mismatch never
//! reaches the network.

use crate::core::error::{Result, TrondError};
use crate::core::{fs_utils, output};
use crate::core::progress::{self, ProgressGuard};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::http;
use super::verify::{self, ChecksumReference};

/// Read/write chunk size; the progress bar advances once per chunk.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// One file to fetch.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub reference: Option<ChecksumReference>,
    pub file_name: String,
}

impl DownloadTask {
    /// Build a task, deriving the local file name from the URL.
    pub fn new(url: &str, reference: Option<ChecksumReference>) -> Result<Self> {
        let file_name =
            http::last_path_segment(url).ok_or_else(|| TrondError::NoFileName(url.to_string()))?;

        if let Some(r) = &reference
            && r.file_name != file_name
        {
            return Err(TrondError::FilenameMismatch {
                expected: r.file_name.clone(),
                actual: file_name,
            });
        }

        Ok(Self {
            url: url.to_string(),
            reference,
            file_name,
        })
    }

    /// Build a task whose reference is read from a sidecar already on disk.
    pub fn with_sidecar(url: &str, sidecar: Option<&Path>) -> Result<Self> {
        let reference = sidecar.map(ChecksumReference::read).transpose()?;
        Self::new(url, reference)
    }

    /// Where the file lands inside `dest_dir`.
    pub fn destination(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.file_name)
    }

    /// Stream the body to `dest_dir/<file_name>`. Does not verify.
    pub fn fetch(&self, dest_dir: &Path) -> Result<PathBuf> {
        let dest = self.destination(dest_dir);
        output::detail(&format!("downloading {}", self.url));

        let response = http::get(&self.url)?;
        let total = response
            .header("content-length")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|len| *len > 0)
            .ok_or_else(|| TrondError::MissingContentLength(self.url.clone()))?;

        fs_utils::ensure_parent_dir(&dest)?;
        let mut file = std::fs::File::create(&dest)?;
        let pb = progress::create_byte_progress(
            total,
            &format!("{} ({})", self.file_name, output::format_size(total)),
        );
        let _guard = ProgressGuard::new(&pb);

        let mut reader = response.into_reader();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])?;
            pb.inc(n as u64);
        }
        file.flush()?;

        output::detail(&format!("download complete: {}", self.file_name));
        Ok(dest)
    }

    /// Check the fetched file against the task's reference, if any.
    pub fn verify(&self, path: &Path) -> Result<()> {
        match &self.reference {
            Some(r) => verify::verify_md5(path, &r.hash),
            None => Ok(()),
        }
    }
}

/// Download `url` into `dest_dir`, verifying against `sidecar` when given.
///
/// Returns the local path of the downloaded file.
pub fn download_file(url: &str, dest_dir: &Path, sidecar: Option<&Path>) -> Result<PathBuf> {
    let task = DownloadTask::with_sidecar(url, sidecar)?;
    let path = task.fetch(dest_dir)?;
    task.verify(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_file_name_from_url() {
        let task = DownloadTask::new(
            "http://34.143.247.77/backup20250205/LiteFullNode_output-directory.tgz",
            None,
        )
        .unwrap();
        assert_eq!(task.file_name, "LiteFullNode_output-directory.tgz");
    }

    #[test]
    fn test_task_rejects_url_without_file() {
        assert!(matches!(
            DownloadTask::new("http://34.143.247.77/", None),
            Err(TrondError::NoFileName(_))
        ));
    }

    #[test]
    fn test_task_filename_mismatch() {
        let reference = ChecksumReference {
            hash: "abc".into(),
            file_name: "FullNode_output-directory.tgz".into(),
        };
        let err = DownloadTask::new(
            "http://h/backup20250205/LiteFullNode_output-directory.tgz",
            Some(reference),
        )
        .unwrap_err();
        match err {
            TrondError::FilenameMismatch { expected, actual } => {
                assert_eq!(expected, "FullNode_output-directory.tgz");
                assert_eq!(actual, "LiteFullNode_output-directory.tgz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    mod mock_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const BODY: &[u8] = b"hello world";
        const BODY_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

        #[tokio::test]
        async fn test_download_without_reference() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/b/data.tgz"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let url = format!("{}/b/data.tgz", mock_server.uri());
            let out = download_file(&url, dir.path(), None).unwrap();

            assert_eq!(out, dir.path().join("data.tgz"));
            assert_eq!(std::fs::read(&out).unwrap(), BODY);
        }

        #[tokio::test]
        async fn test_download_verified() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/b/data.tgz"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let sidecar = dir.path().join("data.tgz.md5sum");
            std::fs::write(&sidecar, format!("{} data.tgz\n", BODY_MD5)).unwrap();

            let url = format!("{}/b/data.tgz", mock_server.uri());
            download_file(&url, dir.path(), Some(&sidecar)).unwrap();
        }

        #[tokio::test]
        async fn test_download_checksum_mismatch_errors() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/b/data.tgz"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".as_slice()))
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let sidecar = dir.path().join("data.tgz.md5sum");
            std::fs::write(&sidecar, format!("{} data.tgz\n", BODY_MD5)).unwrap();

            let url = format!("{}/b/data.tgz", mock_server.uri());
            let err = download_file(&url, dir.path(), Some(&sidecar)).unwrap_err();
            assert!(matches!(err, TrondError::ChecksumMismatch { .. }));
            // left on disk for inspection
            assert!(dir.path().join("data.tgz").exists());
        }

        #[tokio::test]
        async fn test_filename_mismatch_issues_no_request() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
                .expect(0)
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let sidecar = dir.path().join("ref.md5sum");
            std::fs::write(&sidecar, format!("{} other.tgz\n", BODY_MD5)).unwrap();

            let url = format!("{}/b/data.tgz", mock_server.uri());
            let err = download_file(&url, dir.path(), Some(&sidecar)).unwrap_err();
            assert!(matches!(err, TrondError::FilenameMismatch { .. }));
            assert!(!dir.path().join("data.tgz").exists());

            mock_server.verify().await;
        }

        #[tokio::test]
        async fn test_download_bad_status() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let url = format!("{}/b/data.tgz", mock_server.uri());
            let err = download_file(&url, dir.path(), None).unwrap_err();
            assert!(matches!(err, TrondError::HttpStatus { status: 404, .. }));
        }

        #[tokio::test]
        async fn test_download_empty_body_has_no_size() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&mock_server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let url = format!("{}/b/data.tgz", mock_server.uri());
            let err = download_file(&url, dir.path(), None).unwrap_err();
            assert!(matches!(err, TrondError::MissingContentLength(_)));
        }
    }
}
