//! Acquire helpers: HTTP access, streaming downloads and checksum
//! verification.

pub mod download;
pub mod http;
pub mod verify;

pub use download::{DownloadTask, download_file};
pub use verify::{ChecksumReference, compute_md5, verify_md5};
