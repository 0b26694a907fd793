//! Checksum verification
//!
//! Snapshot sources publish an `.md5sum` sidecar next to every archive, in
//! the `md5sum` tool's format: `<hash> <filename>`.

use crate::core::error::{Result, TrondError};
use crate::core::output;
use crate::core::progress::{self, ProgressGuard};
use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Expected hash and file name read from a sidecar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumReference {
    pub hash: String,
    pub file_name: String,
}

impl ChecksumReference {
    /// Parse `<hash> <filename>`; extra tokens are ignored.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut tokens = contents.split_whitespace();
        let hash = tokens.next()?;
        let file_name = tokens.next()?;
        Some(Self {
            hash: hash.to_string(),
            file_name: file_name.to_string(),
        })
    }

    /// Read and parse a sidecar file.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents).ok_or_else(|| TrondError::MalformedChecksum(path.to_path_buf()))
    }
}

/// Compute the lowercase hex MD5 of a file.
///
/// Shows progress for files larger than 100MB.
pub fn compute_md5(path: &Path) -> Result<String> {
    let mut f = std::fs::File::open(path)?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);

    let pb = (file_size > PROGRESS_THRESHOLD)
        .then(|| progress::create_byte_progress(file_size, "checksum"));
    let _guard = pb.as_ref().map(ProgressGuard::new);

    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if let Some(pb) = &pb {
            pb.inc(n as u64);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against a reference hash.
///
/// The comparison is exact: the sidecar's hash string must equal the
/// computed lowercase hex digest. A mismatching file is left in place.
pub fn verify_md5(path: &Path, expected: &str) -> Result<()> {
    output::detail(&format!("verifying md5 of {}", path.display()));
    let actual = compute_md5(path)?;
    output::field("expected", expected);
    output::field("calculated", &actual);

    if actual != expected {
        return Err(TrondError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }

    output::detail("md5 verification successful");
    Ok(())
}
